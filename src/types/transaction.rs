//! Payment transaction as seen by the payment services
//!
//! A `BitcoinTransaction` is an immutable value. Each RPC stage of a
//! request or send produces a new version through the consuming `with_*`
//! methods.

use crate::errors::CurrencyError;
use crate::types::identifiers::{Address, Hash};
use crate::utils::currency::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Default confirmation target handed back with requested payments
pub const DEFAULT_CONF_TARGET: u32 = 3;

/// Address and value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: Address,
    pub value: Money,
}

impl Output {
    pub fn new(address: Address, value: Money) -> Self {
        Self { address, value }
    }
}

/// Sum of output values
pub fn total_value(outputs: &[Output]) -> Result<Money, CurrencyError> {
    outputs
        .iter()
        .try_fold(Money::zero(Currency::Msat), |total, output| {
            total.checked_add(output.value)
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinTransaction {
    id: Option<Hash>,
    label: String,
    amount: Money,
    outputs: Vec<Output>,
    confirmations: u64,
    fee_settled: Money,
    fee_rate: Money,
    rbf: bool,
    conf_target: u32,
}

impl BitcoinTransaction {
    /// New payment for `amount`, not yet addressed or funded
    pub fn new(label: impl Into<String>, amount: Money) -> Self {
        Self {
            id: None,
            label: label.into(),
            amount,
            outputs: Vec::new(),
            confirmations: 0,
            fee_settled: Money::zero(Currency::Msat),
            fee_rate: Money::zero(Currency::Btc),
            rbf: false,
            conf_target: DEFAULT_CONF_TARGET,
        }
    }

    pub fn id(&self) -> Option<&Hash> {
        self.id.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn confirmations(&self) -> u64 {
        self.confirmations
    }

    pub fn fee_settled(&self) -> Money {
        self.fee_settled
    }

    /// Fee rate in BTC per kvB
    pub fn fee_rate(&self) -> Money {
        self.fee_rate
    }

    pub fn rbf(&self) -> bool {
        self.rbf
    }

    pub fn conf_target(&self) -> u32 {
        self.conf_target
    }

    pub fn with_id(self, id: Hash) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    pub fn with_outputs(self, outputs: Vec<Output>) -> Self {
        Self { outputs, ..self }
    }

    pub fn with_output(self, output: Output) -> Self {
        let mut outputs = self.outputs.clone();
        outputs.push(output);
        Self { outputs, ..self }
    }

    pub fn with_confirmations(self, confirmations: u64) -> Self {
        Self {
            confirmations,
            ..self
        }
    }

    pub fn with_fee_settled(self, fee_settled: Money) -> Self {
        Self {
            fee_settled,
            ..self
        }
    }

    pub fn with_fee_rate(self, fee_rate: Money) -> Self {
        Self { fee_rate, ..self }
    }

    pub fn with_rbf(self, rbf: bool) -> Self {
        Self { rbf, ..self }
    }

    pub fn with_conf_target(self, conf_target: u32) -> Self {
        Self {
            conf_target,
            ..self
        }
    }
}
