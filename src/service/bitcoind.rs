use crate::errors::{CurrencyError, PaymentError, PaymentResult, RpcError};
use crate::rpc::response::{field_array, field_i64, field_number_text, field_str, field_u64};
use crate::rpc::NodeRpc;
use crate::service::eligibility::{self, ServiceSettings};
use crate::types::transaction::total_value;
use crate::types::{Address, BitcoinBlock, BitcoinTransaction, Hash, Output};
use crate::utils::currency::{format_sats_as_btc, CurrencyConverter, Money};
use crate::utils::time::timestamp_to_datetime;
use serde_json::{json, Map, Value};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of `fundrawtransaction`
struct FundedTransaction {
    hex: String,
    fee: Money,
}

/// Payment service backed by a bitcoind wallet
pub struct BitcoindService<R: NodeRpc + ?Sized> {
    rpc: Arc<R>,
    converter: CurrencyConverter,
    settings: ServiceSettings,
}

impl<R: NodeRpc + ?Sized> BitcoindService<R> {
    pub fn new(rpc: Arc<R>, converter: CurrencyConverter, settings: ServiceSettings) -> Self {
        Self {
            rpc,
            converter,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Hand out a fresh receive address for the requested amount
    pub async fn request(
        &self,
        transaction: BitcoinTransaction,
    ) -> PaymentResult<BitcoinTransaction> {
        if !self.can_request(&transaction.amount()) {
            return Err(PaymentError::Ineligible(
                "Bitcoind service cannot request given amount.".to_string(),
            ));
        }

        let result = self
            .call(
                "getnewaddress",
                vec![json!(transaction.label()), json!(self.settings.address_type)],
            )
            .await?;
        let address = result
            .as_str()
            .ok_or_else(|| invalid_data("getnewaddress did not return an address"))
            .and_then(|s| Address::from_str(s).map_err(invalid_data))?;

        debug!("Requested address {} for {}", address, transaction.amount());
        let amount = transaction.amount();
        Ok(transaction
            .with_outputs(vec![Output::new(address, amount)])
            .with_conf_target(self.settings.conf_target))
    }

    /// Create, fund, sign and broadcast a transaction paying its outputs
    pub async fn send(&self, transaction: BitcoinTransaction) -> PaymentResult<BitcoinTransaction> {
        if !self.can_send(&transaction.amount()) {
            return Err(PaymentError::Ineligible(
                "Bitcoind service cannot send given amount.".to_string(),
            ));
        }

        let paying = total_value(transaction.outputs())?;
        let funded = self.create_funded_transaction(&transaction).await?;

        let signed = self
            .call("signrawtransactionwithwallet", vec![json!(funded.hex)])
            .await?;
        if signed.get("complete").and_then(Value::as_bool) != Some(true) {
            return Err(PaymentError::failed("incomplete transaction"));
        }
        let signed_hex = field_str(&signed, "hex").map_err(invalid_data)?;

        // Max fee rate 0 leaves the fee ceiling to the funding step
        let txid = self
            .call("sendrawtransaction", vec![json!(signed_hex), json!(0)])
            .await?;
        let id = txid
            .as_str()
            .ok_or_else(|| invalid_data("sendrawtransaction did not return a txid"))
            .and_then(|s| Hash::from_str(s).map_err(invalid_data))?;

        info!(
            "Broadcast transaction {} paying {} with fee {}",
            id,
            paying,
            format_sats_as_btc(funded.fee.sat())
        );
        Ok(transaction.with_id(id).with_fee_settled(funded.fee))
    }

    pub async fn validate_address(&self, address: &Address) -> PaymentResult<bool> {
        let result = self
            .call("validateaddress", vec![json!(address.as_str())])
            .await?;
        Ok(result.get("isvalid").and_then(Value::as_bool) == Some(true))
    }

    /// Fee the node would apply when funding this transaction
    pub async fn estimate_fee(&self, transaction: &BitcoinTransaction) -> PaymentResult<Money> {
        Ok(self.create_funded_transaction(transaction).await?.fee)
    }

    pub async fn get_block(&self, id: &Hash) -> PaymentResult<BitcoinBlock> {
        let result = self.call("getblock", vec![json!(id.as_str())]).await?;

        let time = field_i64(&result, "time").map_err(invalid_data)?;
        let transactions = field_array(&result, "tx")
            .map_err(invalid_data)?
            .iter()
            .map(|tx| {
                tx.as_str()
                    .ok_or_else(|| invalid_data("block tx entry is not a string"))
                    .and_then(|s| Hash::from_str(s).map_err(invalid_data))
            })
            .collect::<PaymentResult<Vec<_>>>()?;

        Ok(BitcoinBlock {
            hash: parse_hash(&result, "hash")?,
            merkle_root: parse_hash(&result, "merkleroot")?,
            confirmations: field_i64(&result, "confirmations").map_err(invalid_data)?,
            transactions,
            height: field_u64(&result, "height").map_err(invalid_data)?,
            timestamp: timestamp_to_datetime(time)
                .ok_or_else(|| invalid_data(format!("block time {} out of range", time)))?,
        })
    }

    /// Look up a wallet transaction; `None` when the node does not know the id
    pub async fn get_transaction(&self, id: &Hash) -> PaymentResult<Option<BitcoinTransaction>> {
        let command = "gettransaction";
        let result = match self.rpc.call(command, vec![json!(id.as_str())]).await {
            Ok(result) => result,
            Err(e) if e.is_unrecognised_tx_id() => {
                debug!("Transaction {} not known to wallet", id);
                return Ok(None);
            }
            Err(e) => return Err(classify(command, e)),
        };

        let details = field_array(&result, "details").map_err(invalid_data)?;
        let (outputs, amount) = self.send_outputs(details)?;
        let label = details
            .iter()
            .find_map(|entry| entry.get("label").and_then(Value::as_str))
            .unwrap_or_default();
        let fee = match field_number_text(&result, "fee") {
            Ok(fee) => self.converter.from_btc(&fee)?,
            Err(_) => Money::zero(self.converter.internal_currency()),
        };
        // Conflicted transactions report negative confirmations
        let confirmations = field_i64(&result, "confirmations")
            .map_err(invalid_data)?
            .max(0) as u64;
        let rbf = result.get("bip125-replaceable").and_then(Value::as_str) == Some("yes");

        Ok(Some(
            BitcoinTransaction::new(label, amount)
                .with_id(parse_hash(&result, "txid")?)
                .with_outputs(outputs)
                .with_confirmations(confirmations)
                .with_fee_settled(fee)
                .with_rbf(rbf),
        ))
    }

    /// Amount received by `address` with at least `confirmations`
    pub async fn get_confirmed_balance(
        &self,
        address: &Address,
        confirmations: u32,
    ) -> PaymentResult<Money> {
        let result = self
            .call(
                "listreceivedbyaddress",
                vec![
                    json!(confirmations),
                    json!(false),
                    json!(false),
                    json!(address.as_str()),
                ],
            )
            .await?;

        match result.as_array().and_then(|entries| entries.first()) {
            Some(entry) => {
                let amount = field_number_text(entry, "amount").map_err(invalid_data)?;
                Ok(self.converter.from_btc(&amount)?)
            }
            None => Ok(Money::zero(self.converter.internal_currency())),
        }
    }

    pub fn can_request(&self, amount: &Money) -> bool {
        eligibility::can_request(&self.settings, amount)
    }

    pub fn can_send(&self, amount: &Money) -> bool {
        eligibility::can_send(&self.settings, amount)
    }

    async fn call(&self, command: &str, params: Vec<Value>) -> PaymentResult<Value> {
        self.rpc
            .call(command, params)
            .await
            .map_err(|e| classify(command, e))
    }

    async fn create_funded_transaction(
        &self,
        transaction: &BitcoinTransaction,
    ) -> PaymentResult<FundedTransaction> {
        let outputs = transaction
            .outputs()
            .iter()
            .map(|output| {
                let mut entry = Map::new();
                entry.insert(
                    output.address.to_string(),
                    Value::String(self.converter.format_for_rpc(&output.value)?),
                );
                Ok(Value::Object(entry))
            })
            .collect::<Result<Vec<_>, CurrencyError>>()?;

        let raw = self
            .call(
                "createrawtransaction",
                vec![json!([]), Value::Array(outputs), json!(0), json!(self.settings.rbf)],
            )
            .await?;
        let raw_hex = raw
            .as_str()
            .ok_or_else(|| invalid_data("createrawtransaction did not return hex"))?;

        let mut options = Map::new();
        if !transaction.fee_rate().is_zero() {
            options.insert(
                "feeRate".to_string(),
                json!(self.converter.format_fee_rate(&transaction.fee_rate())),
            );
        }
        options.insert("change_type".to_string(), json!(self.settings.change_type));

        let funded = self
            .call("fundrawtransaction", vec![json!(raw_hex), Value::Object(options)])
            .await?;
        let fee = field_number_text(&funded, "fee").map_err(invalid_data)?;

        Ok(FundedTransaction {
            hex: field_str(&funded, "hex").map_err(invalid_data)?.to_string(),
            fee: self.converter.from_btc(&fee)?,
        })
    }

    /// Outputs of the `send` category with their sign stripped, and their total
    ///
    /// Entries without an address (OP_RETURN data outputs) count towards the
    /// total but produce no `Output`.
    fn send_outputs(&self, details: &[Value]) -> PaymentResult<(Vec<Output>, Money)> {
        let mut outputs = Vec::new();
        let mut total = Money::zero(self.converter.internal_currency());

        for entry in details
            .iter()
            .filter(|entry| entry.get("category").and_then(Value::as_str) == Some("send"))
        {
            let amount = field_number_text(entry, "amount").map_err(invalid_data)?;
            let value = self.converter.from_btc(&amount)?;
            total = total.checked_add(value)?;

            match entry.get("address").and_then(Value::as_str) {
                Some(address) => outputs.push(Output::new(
                    Address::from_str(address).map_err(invalid_data)?,
                    value,
                )),
                None => debug!("Send entry without address counted in total only"),
            }
        }

        Ok((outputs, total))
    }
}

/// Map a node failure onto the payment error taxonomy
fn classify(command: &str, error: RpcError) -> PaymentError {
    if error.is_insufficient_funds() {
        return PaymentError::Unavailable {
            command: command.to_string(),
            message: error.to_string(),
        };
    }
    let message = match &error {
        RpcError::Node { .. } => error.to_string(),
        other => format!("Bitcoind '{}' request failed: {}", command, other),
    };
    PaymentError::Failed {
        command: Some(command.to_string()),
        code: error.code(),
        message,
    }
}

fn invalid_data(error: impl Display) -> PaymentError {
    warn!("Unexpected node response: {}", error);
    PaymentError::InvalidData(error.to_string())
}

fn parse_hash(value: &Value, field: &str) -> PaymentResult<Hash> {
    let raw = field_str(value, field).map_err(invalid_data)?;
    Hash::from_str(raw).map_err(invalid_data)
}
