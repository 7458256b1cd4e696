// 9.0 ledger.rs: MOCKED. host chain state in memory: native balances, ERC-20 balances and
// allowances, ERC-721 ownership and operator approvals, and the block clock.
// no gas. every call that moves value either fully applies or returns an error untouched.

use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};

use crate::types::Timestamp;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    chain_id: u64,
    now: Timestamp,
    native: HashMap<Address, U256>,
    // (token, holder)
    erc20: HashMap<(Address, Address), U256>,
    // (token, owner, spender)
    allowances: HashMap<(Address, Address, Address), U256>,
    // (token, id) -> owner
    erc721: HashMap<(Address, U256), Address>,
    // (token, owner, operator)
    operators: HashSet<(Address, Address, Address)>,
}

impl Ledger {
    pub fn new(chain_id: u64, now: Timestamp) -> Self {
        Self {
            chain_id,
            now,
            ..Self::default()
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn set_time(&mut self, now: Timestamp) {
        self.now = now;
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.now = self.now.plus(secs);
    }

    // faucet for tests and the simulator
    pub fn fund(&mut self, account: Address, amount: U256) {
        let balance = self.native.entry(account).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.native.get(&account).copied().unwrap_or(U256::ZERO)
    }

    pub fn transfer_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.balance_of(from);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                available,
                requested: amount,
            });
        }
        if from == to || amount.is_zero() {
            return Ok(());
        }
        self.native.insert(from, available - amount);
        let credited = self.balance_of(to).checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.native.insert(to, credited);
        Ok(())
    }

    // ERC-20

    pub fn mint_erc20(&mut self, token: Address, to: Address, amount: U256) {
        let balance = self.erc20.entry((token, to)).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    pub fn erc20_balance(&self, token: Address, holder: Address) -> U256 {
        self.erc20.get(&(token, holder)).copied().unwrap_or(U256::ZERO)
    }

    pub fn approve_erc20(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(token, owner, spender)).copied().unwrap_or(U256::ZERO)
    }

    /// transferFrom semantics: `operator` spends allowance unless it is the holder.
    pub fn transfer_erc20(
        &mut self,
        token: Address,
        operator: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let available = self.erc20_balance(token, from);
        if amount > available {
            return Err(LedgerError::InsufficientTokenBalance {
                token,
                account: from,
                available,
                requested: amount,
            });
        }
        if operator != from {
            let allowed = self.allowance(token, from, operator);
            if amount > allowed {
                return Err(LedgerError::InsufficientAllowance {
                    token,
                    owner: from,
                    spender: operator,
                    allowed,
                    requested: amount,
                });
            }
            if allowed != U256::MAX {
                self.allowances.insert((token, from, operator), allowed - amount);
            }
        }
        if from == to {
            return Ok(());
        }
        self.erc20.insert((token, from), available - amount);
        let credited = self.erc20_balance(token, to).checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.erc20.insert((token, to), credited);
        Ok(())
    }

    /// WETH9 deposit: native moves into the token contract, the holder is credited tokens.
    pub fn wrap_native(&mut self, weth: Address, holder: Address, amount: U256) -> Result<(), LedgerError> {
        self.transfer_native(holder, weth, amount)?;
        self.mint_erc20(weth, holder, amount);
        Ok(())
    }

    /// WETH9 withdraw: burns the holder's tokens and releases the backing native.
    pub fn unwrap_native(&mut self, weth: Address, holder: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.erc20_balance(weth, holder);
        if amount > available {
            return Err(LedgerError::InsufficientTokenBalance {
                token: weth,
                account: holder,
                available,
                requested: amount,
            });
        }
        self.transfer_native(weth, holder, amount)?;
        self.erc20.insert((weth, holder), available - amount);
        Ok(())
    }

    // ERC-721

    pub fn mint_nft(&mut self, token: Address, id: U256, to: Address) -> Result<(), LedgerError> {
        if self.erc721.contains_key(&(token, id)) {
            return Err(LedgerError::TokenExists { token, id });
        }
        self.erc721.insert((token, id), to);
        Ok(())
    }

    pub fn owner_of(&self, token: Address, id: U256) -> Option<Address> {
        self.erc721.get(&(token, id)).copied()
    }

    pub fn nft_balance(&self, token: Address, owner: Address) -> usize {
        self.erc721
            .iter()
            .filter(|((t, _), o)| *t == token && **o == owner)
            .count()
    }

    pub fn set_approval_for_all(&mut self, token: Address, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.insert((token, owner, operator));
        } else {
            self.operators.remove(&(token, owner, operator));
        }
    }

    pub fn is_approved_for_all(&self, token: Address, owner: Address, operator: Address) -> bool {
        self.operators.contains(&(token, owner, operator))
    }

    pub fn transfer_nft(
        &mut self,
        token: Address,
        id: U256,
        operator: Address,
        from: Address,
        to: Address,
    ) -> Result<(), LedgerError> {
        let owner = self.owner_of(token, id).ok_or(LedgerError::UnknownToken { token, id })?;
        if owner != from {
            return Err(LedgerError::NotTokenOwner { token, id, owner, from });
        }
        if operator != from && !self.is_approved_for_all(token, from, operator) {
            return Err(LedgerError::NotApproved { token, owner: from, operator });
        }
        self.erc721.insert((token, id), to);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance { account: Address, available: U256, requested: U256 },

    #[error("insufficient {token} balance for {account}: available {available}, requested {requested}")]
    InsufficientTokenBalance { token: Address, account: Address, available: U256, requested: U256 },

    #[error("insufficient {token} allowance from {owner} to {spender}: allowed {allowed}, requested {requested}")]
    InsufficientAllowance { token: Address, owner: Address, spender: Address, allowed: U256, requested: U256 },

    #[error("token {token}#{id} already minted")]
    TokenExists { token: Address, id: U256 },

    #[error("token {token}#{id} does not exist")]
    UnknownToken { token: Address, id: U256 },

    #[error("token {token}#{id} is owned by {owner}, not {from}")]
    NotTokenOwner { token: Address, id: U256, owner: Address, from: Address },

    #[error("{operator} is not approved to move {token} for {owner}")]
    NotApproved { token: Address, owner: Address, operator: Address },

    #[error("balance overflow")]
    Overflow,
}
