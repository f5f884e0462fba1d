//! Tests for the payment service
//!
//! Each test scripts the exact node replies for one operation and checks
//! both the outcome and the commands that reached the node.

use crate::common::{hex_id, ScriptedNode};
use bitcoind_adapter::errors::{PaymentError, RpcError};
use bitcoind_adapter::service::{BitcoindService, ServiceSettings};
use bitcoind_adapter::types::{Address, BitcoinTransaction, Hash, Output};
use bitcoind_adapter::utils::currency::{CurrencyConverter, Money};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

fn service(node: &Arc<ScriptedNode>) -> BitcoindService<ScriptedNode> {
    service_with(node, ServiceSettings::default())
}

fn service_with(
    node: &Arc<ScriptedNode>,
    settings: ServiceSettings,
) -> BitcoindService<ScriptedNode> {
    BitcoindService::new(Arc::clone(node), CurrencyConverter::default(), settings)
}

fn money(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

fn payment(amount: &str) -> BitcoinTransaction {
    let amount = money(amount);
    BitcoinTransaction::new("invoice-42", amount).with_output(Output::new(
        Address::from_str("bcrt1qdestination").unwrap(),
        amount,
    ))
}

fn script_funding(node: &ScriptedNode) {
    node.ok("createrawtransaction", json!("0200raw"))
        .ok(
            "fundrawtransaction",
            json!({"hex": "0200funded", "fee": "0.00000141", "changepos": "1"}),
        );
}

#[tokio::test]
async fn test_send_runs_full_pipeline() {
    let node = ScriptedNode::new();
    script_funding(&node);
    node.ok(
        "signrawtransactionwithwallet",
        json!({"hex": "0200signed", "complete": true}),
    )
    .ok("sendrawtransaction", json!(hex_id(0xab)));

    let sent = service(&node).send(payment("1500SAT")).await.unwrap();

    assert_eq!(
        node.commands(),
        vec![
            "createrawtransaction",
            "fundrawtransaction",
            "signrawtransactionwithwallet",
            "sendrawtransaction"
        ]
    );
    assert_eq!(sent.id().map(Hash::as_str), Some(hex_id(0xab).as_str()));
    assert_eq!(sent.fee_settled().sat(), 141);
    assert_eq!(sent.amount().sat(), 1500);

    assert_eq!(
        node.params_of("createrawtransaction"),
        vec![
            json!([]),
            json!([{"bcrt1qdestination": "0.00001500"}]),
            json!(0),
            json!(true)
        ]
    );
    assert_eq!(
        node.params_of("fundrawtransaction"),
        vec![json!("0200raw"), json!({"change_type": "bech32"})]
    );
    assert_eq!(
        node.params_of("signrawtransactionwithwallet"),
        vec![json!("0200funded")]
    );
    assert_eq!(
        node.params_of("sendrawtransaction"),
        vec![json!("0200signed"), json!(0)]
    );
}

#[tokio::test]
async fn test_send_passes_fee_rate_when_set() {
    let node = ScriptedNode::new();
    script_funding(&node);
    node.ok(
        "signrawtransactionwithwallet",
        json!({"hex": "0200signed", "complete": true}),
    )
    .ok("sendrawtransaction", json!(hex_id(0x01)));

    let transaction = payment("0.001BTC").with_fee_rate(money("0.0002BTC"));
    service(&node).send(transaction).await.unwrap();

    assert_eq!(
        node.params_of("fundrawtransaction")[1],
        json!({"feeRate": "0.00020000", "change_type": "bech32"})
    );
}

#[tokio::test]
async fn test_send_stops_on_incomplete_signature() {
    let node = ScriptedNode::new();
    script_funding(&node);
    node.ok(
        "signrawtransactionwithwallet",
        json!({"hex": "0200partial", "complete": false}),
    );

    let err = service(&node).send(payment("1500SAT")).await.unwrap_err();

    assert_eq!(err, PaymentError::failed("incomplete transaction"));
    assert!(!node.commands().contains(&"sendrawtransaction".to_string()));
}

#[tokio::test]
async fn test_send_insufficient_funds_is_unavailable() {
    let node = ScriptedNode::new();
    node.ok("createrawtransaction", json!("0200raw"))
        .node_error("fundrawtransaction", -4, "Insufficient funds");

    let err = service(&node).send(payment("1500SAT")).await.unwrap_err();

    match err {
        PaymentError::Unavailable { command, message } => {
            assert_eq!(command, "fundrawtransaction");
            assert!(message.contains("Insufficient funds"));
        }
        other => panic!("expected Unavailable, got {:?}", other),
    }
    assert_eq!(node.commands().len(), 2);
}

#[tokio::test]
async fn test_send_node_error_is_failed_with_code() {
    let node = ScriptedNode::new();
    script_funding(&node);
    node.ok(
        "signrawtransactionwithwallet",
        json!({"hex": "0200signed", "complete": true}),
    )
    .node_error("sendrawtransaction", -26, "min relay fee not met");

    let err = service(&node).send(payment("1500SAT")).await.unwrap_err();

    assert_eq!(err.code(), Some(-26));
    assert_eq!(
        err.to_string(),
        "Bitcoind 'sendrawtransaction' error (-26): min relay fee not met"
    );
}

#[tokio::test]
async fn test_send_transport_error_is_failed() {
    let node = ScriptedNode::new();
    node.push(
        "createrawtransaction",
        Err(RpcError::ConnectionFailed("connection refused".to_string())),
    );

    let err = service(&node).send(payment("1500SAT")).await.unwrap_err();

    match err {
        PaymentError::Failed { command, code, message } => {
            assert_eq!(command.as_deref(), Some("createrawtransaction"));
            assert_eq!(code, None);
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_below_minimum_makes_no_calls() {
    let node = ScriptedNode::new();
    let settings = ServiceSettings {
        send_minimum: money("546SAT"),
        ..ServiceSettings::default()
    };

    let err = service_with(&node, settings)
        .send(payment("545SAT"))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Ineligible(_)));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_send_disabled_makes_no_calls() {
    let node = ScriptedNode::new();
    let settings = ServiceSettings {
        send_enabled: false,
        ..ServiceSettings::default()
    };

    let result = service_with(&node, settings).send(payment("1BTC")).await;

    assert!(matches!(result, Err(PaymentError::Ineligible(_))));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_request_returns_new_address() {
    let node = ScriptedNode::new();
    node.ok("getnewaddress", json!("mhNewAddress1"));

    let requested = service(&node)
        .request(BitcoinTransaction::new("order-9", money("2500SAT")))
        .await
        .unwrap();

    assert_eq!(
        node.params_of("getnewaddress"),
        vec![json!("order-9"), json!("legacy")]
    );
    assert_eq!(requested.outputs().len(), 1);
    assert_eq!(requested.outputs()[0].address.as_str(), "mhNewAddress1");
    assert_eq!(requested.outputs()[0].value.sat(), 2500);
    assert_eq!(requested.conf_target(), 3);
}

#[tokio::test]
async fn test_request_zero_amount_is_ineligible() {
    let node = ScriptedNode::new();

    let result = service(&node)
        .request(BitcoinTransaction::new("order-0", Money::from_msat(0)))
        .await;

    assert!(matches!(result, Err(PaymentError::Ineligible(_))));
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_estimate_fee_does_not_sign() {
    let node = ScriptedNode::new();
    script_funding(&node);

    let fee = service(&node)
        .estimate_fee(&payment("1500SAT"))
        .await
        .unwrap();

    assert_eq!(fee.msat(), 141_000);
    assert_eq!(
        node.commands(),
        vec!["createrawtransaction", "fundrawtransaction"]
    );
}

#[tokio::test]
async fn test_validate_address() {
    let node = ScriptedNode::new();
    node.ok("validateaddress", json!({"isvalid": true, "address": "mhValid"}))
        .ok("validateaddress", json!({"isvalid": false}));
    let service = service(&node);

    assert!(service
        .validate_address(&Address::from_str("mhValid").unwrap())
        .await
        .unwrap());
    assert!(!service
        .validate_address(&Address::from_str("nonsense").unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_get_block() {
    let node = ScriptedNode::new();
    node.ok(
        "getblock",
        json!({
            "hash": hex_id(0x0b),
            "merkleroot": hex_id(0x0c),
            "confirmations": "12",
            "height": "800000",
            "time": "1700000000",
            "tx": [hex_id(0x01), hex_id(0x02)]
        }),
    );

    let block = service(&node)
        .get_block(&Hash::from_str(&hex_id(0x0b)).unwrap())
        .await
        .unwrap();

    assert_eq!(block.hash.as_str(), hex_id(0x0b));
    assert_eq!(block.merkle_root.as_str(), hex_id(0x0c));
    assert_eq!(block.confirmations, 12);
    assert_eq!(block.height, 800_000);
    assert_eq!(block.timestamp.timestamp(), 1_700_000_000);
    assert_eq!(block.transactions.len(), 2);
}

#[tokio::test]
async fn test_get_block_missing_field_is_invalid_data() {
    let node = ScriptedNode::new();
    node.ok("getblock", json!({"hash": hex_id(0x0b)}));

    let result = service(&node)
        .get_block(&Hash::from_str(&hex_id(0x0b)).unwrap())
        .await;

    assert!(matches!(result, Err(PaymentError::InvalidData(_))));
}

#[tokio::test]
async fn test_get_transaction() {
    let node = ScriptedNode::new();
    node.ok(
        "gettransaction",
        json!({
            "txid": hex_id(0x0a),
            "confirmations": "2",
            "fee": "-0.00000141",
            "bip125-replaceable": "no",
            "details": [
                {
                    "category": "send",
                    "address": "mhPayeeOne",
                    "amount": "-0.00001000",
                    "label": "invoice-42"
                },
                {"category": "send", "address": "mhPayeeTwo", "amount": "-0.00000500"},
                {"category": "receive", "address": "mhChange", "amount": "0.00100000"}
            ]
        }),
    );

    let transaction = service(&node)
        .get_transaction(&Hash::from_str(&hex_id(0x0a)).unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(transaction.id().map(Hash::as_str), Some(hex_id(0x0a).as_str()));
    assert_eq!(transaction.label(), "invoice-42");
    assert_eq!(transaction.outputs().len(), 2);
    assert_eq!(transaction.outputs()[0].value.sat(), 1000);
    assert_eq!(transaction.amount().sat(), 1500);
    assert_eq!(transaction.fee_settled().sat(), 141);
    assert_eq!(transaction.confirmations(), 2);
    assert!(!transaction.rbf());
}

#[tokio::test]
async fn test_get_transaction_with_data_output() {
    let node = ScriptedNode::new();
    node.ok(
        "gettransaction",
        json!({
            "txid": hex_id(0x0f),
            "confirmations": "1",
            "fee": "-0.00000200",
            "details": [
                {"category": "send", "address": "mhPayeeOne", "amount": "-0.00001000", "vout": "0"},
                {"category": "send", "amount": "-0.00000330", "vout": "1"}
            ]
        }),
    );

    let transaction = service(&node)
        .get_transaction(&Hash::from_str(&hex_id(0x0f)).unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(transaction.outputs().len(), 1);
    assert_eq!(transaction.outputs()[0].address.as_str(), "mhPayeeOne");
    assert_eq!(transaction.amount().sat(), 1330);
    assert_eq!(transaction.fee_settled().sat(), 200);
}

#[tokio::test]
async fn test_get_transaction_conflicted_and_replaceable() {
    let node = ScriptedNode::new();
    node.ok(
        "gettransaction",
        json!({
            "txid": hex_id(0x0d),
            "confirmations": "-1",
            "bip125-replaceable": "yes",
            "details": []
        }),
    );

    let transaction = service(&node)
        .get_transaction(&Hash::from_str(&hex_id(0x0d)).unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(transaction.confirmations(), 0);
    assert!(transaction.rbf());
    assert!(transaction.fee_settled().is_zero());
    assert!(transaction.amount().is_zero());
}

#[tokio::test]
async fn test_get_transaction_unknown_id_is_none() {
    let node = ScriptedNode::new();
    node.node_error(
        "gettransaction",
        -5,
        "Invalid or non-wallet transaction id",
    );

    let result = service(&node)
        .get_transaction(&Hash::from_str(&hex_id(0x0e)).unwrap())
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_transaction_other_error_propagates() {
    let node = ScriptedNode::new();
    node.node_error("gettransaction", -18, "Requested wallet does not exist");

    let err = service(&node)
        .get_transaction(&Hash::from_str(&hex_id(0x0e)).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(-18));
}

#[tokio::test]
async fn test_confirmed_balance() {
    let node = ScriptedNode::new();
    node.ok(
        "listreceivedbyaddress",
        json!([{"address": "mhReceiver", "amount": "0.00012345", "confirmations": "6"}]),
    );

    let balance = service(&node)
        .get_confirmed_balance(&Address::from_str("mhReceiver").unwrap(), 6)
        .await
        .unwrap();

    assert_eq!(balance.sat(), 12_345);
    assert_eq!(
        node.params_of("listreceivedbyaddress"),
        vec![json!(6), json!(false), json!(false), json!("mhReceiver")]
    );
}

#[tokio::test]
async fn test_confirmed_balance_defaults_to_zero() {
    let node = ScriptedNode::new();
    node.ok("listreceivedbyaddress", json!([]));

    let balance = service(&node)
        .get_confirmed_balance(&Address::from_str("mhUnused").unwrap(), 1)
        .await
        .unwrap();

    assert!(balance.is_zero());
}

#[test]
fn test_eligibility_checks_make_no_calls() {
    let node = ScriptedNode::new();
    let service = service_with(
        &node,
        ServiceSettings {
            request_minimum: money("1000SAT"),
            ..ServiceSettings::default()
        },
    );

    assert!(service.can_request(&money("1000SAT")));
    assert!(!service.can_request(&money("999SAT")));
    assert!(service.can_send(&money("1SAT")));
    assert!(node.calls().is_empty());
}
