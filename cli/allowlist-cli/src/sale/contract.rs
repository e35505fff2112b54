use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};
use tracing::info;

use crate::address::Address;
use crate::common::Hash32;
use crate::config::Config;
use crate::sale::transport::{CallRequest, ChainTransport, Receipt, SubmitError};

sol! {
    /// Whitelist sale contract.
    interface IWhitelistSale {
        function isWhitelisted(address account) external view returns (bool whitelisted);
        function mintedPerWallet(address account) external view returns (uint256 minted);
        function MAX_PER_WALLET() external view returns (uint256 max);
        function PRICE_PER_NFT() external view returns (uint256 price);
        function mint(uint256 quantity) external payable;
        function mintWithProof(uint256 quantity, bytes32[] proof) external payable;
        function addToWhitelist(address[] accounts) external;
        function removeFromWhitelist(address[] accounts) external;
        function setMerkleRoot(bytes32 root) external;
        function withdraw() external;
    }

    /// NFT contract minted by the sale.
    interface INft {
        function owner() external view returns (address account);
        function totalMinted() external view returns (uint256 total);
    }
}

use IWhitelistSale::{
    addToWhitelistCall, isWhitelistedCall, mintCall, mintWithProofCall, mintedPerWalletCall,
    removeFromWhitelistCall, setMerkleRootCall, withdrawCall, MAX_PER_WALLETCall,
    PRICE_PER_NFTCall,
};
use INft::{ownerCall, totalMintedCall};

/// Typed calls against the whitelist sale contract and its NFT contract.
pub struct SaleClient<T> {
    transport: T,
    sale: Address,
    nft: Address,
    account: Address,
}

impl<T: ChainTransport> SaleClient<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        SaleClient {
            transport,
            sale: config.sale_address,
            nft: config.nft_address,
            account: config.account,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    fn view<C: SolCall>(&self, to: &Address, call: &C) -> Result<C::Return, SubmitError> {
        let data = self.transport.call(to, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&data, true)?)
    }

    fn transact<C: SolCall>(&self, call: &C, value: U256) -> Result<Receipt, SubmitError> {
        let request = CallRequest {
            from: self.account,
            to: self.sale,
            data: call.abi_encode(),
            value,
        };
        info!(call = C::SIGNATURE, %value, "submitting sale transaction");
        self.transport.send(&request)
    }

    pub fn is_whitelisted(&self, address: &Address) -> Result<bool, SubmitError> {
        let call = isWhitelistedCall {
            account: (*address).into(),
        };
        Ok(self.view(&self.sale, &call)?.whitelisted)
    }

    pub fn minted_per_wallet(&self, address: &Address) -> Result<U256, SubmitError> {
        let call = mintedPerWalletCall {
            account: (*address).into(),
        };
        Ok(self.view(&self.sale, &call)?.minted)
    }

    pub fn max_per_wallet(&self) -> Result<U256, SubmitError> {
        Ok(self.view(&self.sale, &MAX_PER_WALLETCall {})?.max)
    }

    /// Price of one token in wei.
    pub fn price_per_nft(&self) -> Result<U256, SubmitError> {
        Ok(self.view(&self.sale, &PRICE_PER_NFTCall {})?.price)
    }

    pub fn owner(&self) -> Result<Address, SubmitError> {
        Ok(self.view(&self.nft, &ownerCall {})?.account.into())
    }

    pub fn total_minted(&self) -> Result<U256, SubmitError> {
        Ok(self.view(&self.nft, &totalMintedCall {})?.total)
    }

    pub fn mint(&self, quantity: U256, value: U256) -> Result<Receipt, SubmitError> {
        self.transact(&mintCall { quantity }, value)
    }

    pub fn mint_with_proof(
        &self,
        quantity: U256,
        proof: &[Hash32],
        value: U256,
    ) -> Result<Receipt, SubmitError> {
        let call = mintWithProofCall {
            quantity,
            proof: proof.to_vec(),
        };
        self.transact(&call, value)
    }

    pub fn add_to_whitelist(&self, addresses: &[Address]) -> Result<Receipt, SubmitError> {
        let call = addToWhitelistCall {
            accounts: addresses.iter().map(|&address| address.into()).collect(),
        };
        self.transact(&call, U256::ZERO)
    }

    pub fn remove_from_whitelist(&self, addresses: &[Address]) -> Result<Receipt, SubmitError> {
        let call = removeFromWhitelistCall {
            accounts: addresses.iter().map(|&address| address.into()).collect(),
        };
        self.transact(&call, U256::ZERO)
    }

    pub fn set_merkle_root(&self, root: &Hash32) -> Result<Receipt, SubmitError> {
        self.transact(&setMerkleRootCall { root: *root }, U256::ZERO)
    }

    pub fn withdraw(&self) -> Result<Receipt, SubmitError> {
        self.transact(&withdrawCall {}, U256::ZERO)
    }
}
