//! Coordinator-level scenarios (§8): schema union, match assertions, and explode
//! fan-out driven through the public `Transformer` API rather than any one stage in
//! isolation.

use num_bigint::BigInt;
use semabi::{Block, Cell, EvmChain, SemanticAbi, Transformer};
use semabi_abi::parameter::{DataType, ParamKind, Parameter};
use semabi_metadata::{BlockHeader, Log, Receipt, Trace, Transaction};
use semabi_semantic::{ItemExpression, ItemKind, Match, MatchAssert, MatchType, Predicate, SemanticAbiItem, SemanticParameter};

fn address_topic(byte: u8) -> String {
    let mut word = [0u8; 32];
    word[12..].fill(byte);
    format!("0x{}", hex::encode(word))
}

fn uint_word(value: u8) -> String {
    let mut word = [0u8; 32];
    word[31] = value;
    hex::encode(word)
}

fn word_be(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(byte: u8) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].fill(byte);
    word
}

fn string_tail(value: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&word_be(value.len() as u64));
    let mut content = value.as_bytes().to_vec();
    let padded_len = ((content.len() + 31) / 32) * 32;
    content.resize(padded_len, 0);
    out.extend_from_slice(&content);
    out
}

fn transfer_event() -> SemanticAbiItem {
    let from = Parameter::new("from", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    let to = Parameter::new("to", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    let value = Parameter::new("value", ParamKind::Primitive(DataType::Uint(256))).unwrap();
    SemanticAbiItem {
        name: "Transfer".into(),
        kind: ItemKind::Event,
        inputs: vec![SemanticParameter::from_raw(&from), SemanticParameter::from_raw(&to), SemanticParameter::from_raw(&value)],
        outputs: vec![],
        is_primary: true,
        explode: vec![],
        matches: vec![],
        expressions: vec![],
    }
}

fn approval_event() -> SemanticAbiItem {
    let owner = Parameter::new("owner", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    let spender = Parameter::new("spender", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    SemanticAbiItem {
        name: "Approval".into(),
        kind: ItemKind::Event,
        inputs: vec![SemanticParameter::from_raw(&owner), SemanticParameter::from_raw(&spender)],
        outputs: vec![],
        is_primary: false,
        explode: vec![],
        matches: vec![],
        expressions: vec![],
    }
}

fn block(number: u64, transactions: Vec<Transaction>) -> Block {
    Block {
        chain: EvmChain::Ethereum,
        header: BlockHeader { hash: "0xblock".into(), number, timestamp: 1000 },
        transactions,
    }
}

#[test]
fn schema_union_rejects_two_primary_items_with_conflicting_column_types() {
    let a = transfer_event();
    let mut b = transfer_event();
    b.name = "TransferAgain".into();
    b.expressions = vec![ItemExpression {
        name: "value".into(),
        expression: semabi_expr::parse("1").unwrap(),
        result_type: Some(semabi_codec::StorageType::Int64),
    }];
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![a, b]).unwrap();
    assert!(Transformer::build(abi).is_err());
}

#[test]
fn only_one_match_merges_the_sibling_row_under_its_prefix() {
    let mut transfer = transfer_event();
    transfer.matches = vec![Match {
        signature: Some(approval_event().signature()),
        match_type: MatchType::Event,
        prefix: "approval".into(),
        assert: MatchAssert::OnlyOne,
        predicates: vec![Predicate::Equal { source_col: "from".into(), matched_col: "owner".into() }],
    }];
    let approval = approval_event();
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![transfer.clone(), approval.clone()]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let transfer_log = Log {
        address: "0xtoken".into(),
        topics: vec![format!("0x{}", transfer.hash()), address_topic(0xAA), address_topic(0xBB)],
        data: format!("0x{}", uint_word(1)),
        log_index: 0,
    };
    let approval_log = Log {
        address: "0xtoken".into(),
        topics: vec![format!("0x{}", approval.hash()), address_topic(0xAA), address_topic(0xCC)],
        data: "0x".into(),
        log_index: 1,
    };
    let tx = Transaction {
        hash: "0xtx".into(),
        from: "0xfrom".into(),
        to: Some("0xto".into()),
        input: "0x".into(),
        receipt: Receipt {
            transaction_hash: "0xtx".into(),
            status: Some(1),
            gas_used: 1,
            logs: vec![transfer_log, approval_log],
        },
        traces: vec![],
    };

    let rows = transformer.transform(&block(1, vec![tx]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("approval_spender"), Some(&Cell::Hex("cc".repeat(20))));
    assert_eq!(rows[0].get("transform_error"), Some(&Cell::Null));
}

#[test]
fn only_one_match_with_no_candidate_surfaces_a_transform_error_row() {
    let mut transfer = transfer_event();
    transfer.matches = vec![Match {
        signature: Some(approval_event().signature()),
        match_type: MatchType::Event,
        prefix: "approval".into(),
        assert: MatchAssert::OnlyOne,
        predicates: vec![Predicate::Equal { source_col: "from".into(), matched_col: "owner".into() }],
    }];
    let approval = approval_event();
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![transfer.clone(), approval]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let transfer_log = Log {
        address: "0xtoken".into(),
        topics: vec![format!("0x{}", transfer.hash()), address_topic(0xAA), address_topic(0xBB)],
        data: format!("0x{}", uint_word(1)),
        log_index: 0,
    };
    let tx = Transaction {
        hash: "0xtx".into(),
        from: "0xfrom".into(),
        to: Some("0xto".into()),
        input: "0x".into(),
        receipt: Receipt { transaction_hash: "0xtx".into(), status: Some(1), gas_used: 1, logs: vec![transfer_log] },
        traces: vec![],
    };

    let rows = transformer.transform(&block(1, vec![tx]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("transform_error"), Some(&Cell::String("match 'approval': no match".into())));
}

#[test]
fn blocks_on_an_untargeted_chain_produce_no_rows() {
    let transfer = transfer_event();
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![transfer]).unwrap();
    let transformer = Transformer::build(abi).unwrap();
    let rows = transformer.transform(&block_on_chain(EvmChain::Base));
    assert!(rows.is_empty());
}

fn block_on_chain(chain: EvmChain) -> Block {
    Block {
        chain,
        header: BlockHeader { hash: "0xblock".into(), number: 1, timestamp: 1 },
        transactions: vec![],
    }
}

fn empty_receipt(hash: &str, logs: Vec<Log>) -> Receipt {
    Receipt { transaction_hash: hash.into(), status: Some(1), gas_used: 1, logs }
}

fn pool_created_event() -> SemanticAbiItem {
    let token0 = Parameter::new("token0", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    let token1 = Parameter::new("token1", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    let fee = Parameter::new("fee", ParamKind::Primitive(DataType::Uint(24))).unwrap().indexed(true);
    let tick_spacing = Parameter::new("tickSpacing", ParamKind::Primitive(DataType::Int(24))).unwrap();
    let pool = Parameter::new("pool", ParamKind::Primitive(DataType::Address)).unwrap();
    SemanticAbiItem {
        name: "PoolCreated".into(),
        kind: ItemKind::Event,
        inputs: vec![
            SemanticParameter::from_raw(&token0),
            SemanticParameter::from_raw(&token1),
            SemanticParameter::from_raw(&fee),
            SemanticParameter::from_raw(&tick_spacing),
            SemanticParameter::from_raw(&pool),
        ],
        outputs: vec![],
        is_primary: true,
        explode: vec![],
        matches: vec![],
        expressions: vec![],
    }
}

#[test]
fn pool_created_event_is_captured_with_its_indexed_and_data_fields() {
    let item = pool_created_event();
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![item.clone()]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let mut data = Vec::new();
    data.extend_from_slice(&word_be(60));
    data.extend_from_slice(&address_word(0xCC));

    let log = Log {
        address: "0xfactory".into(),
        topics: vec![
            format!("0x{}", item.hash()),
            address_topic(0x96),
            address_topic(0xDD),
            format!("0x{}", hex::encode(word_be(3000))),
        ],
        data: format!("0x{}", hex::encode(data)),
        log_index: 0,
    };
    let tx = Transaction {
        hash: "0xtx1".into(),
        from: "0xfrom".into(),
        to: Some("0xfactory".into()),
        input: "0x".into(),
        receipt: empty_receipt("0xtx1", vec![log]),
        traces: vec![],
    };

    let rows = transformer.transform(&block(1, vec![tx]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("token0"), Some(&Cell::String(format!("0x{}", "96".repeat(20)))));
    assert_eq!(rows[0].get("fee"), Some(&Cell::Integer(BigInt::from(3000))));
    assert_eq!(rows[0].get("tickSpacing"), Some(&Cell::Integer(BigInt::from(60))));
    assert_eq!(rows[0].get("pool"), Some(&Cell::String(format!("0x{}", "cc".repeat(20)))));
    assert_eq!(rows[0].get("explodeIndex"), Some(&Cell::Integer(BigInt::from(0))));
    assert_eq!(rows[0].get("transform_error"), Some(&Cell::Null));
}

fn fulfill_order_function() -> SemanticAbiItem {
    let order_type = Parameter::new("orderType", ParamKind::Primitive(DataType::Uint(8))).unwrap();
    let parameters = Parameter::new("parameters", ParamKind::Tuple(vec![order_type])).unwrap();
    let order = Parameter::new("order", ParamKind::Tuple(vec![parameters])).unwrap();
    let offerer = Parameter::new("offerer", ParamKind::Primitive(DataType::String)).unwrap();
    SemanticAbiItem {
        name: "fulfillOrder".into(),
        kind: ItemKind::Function,
        inputs: vec![SemanticParameter::from_raw(&order), SemanticParameter::from_raw(&offerer)],
        outputs: vec![],
        is_primary: true,
        explode: vec![],
        matches: vec![],
        expressions: vec![
            ItemExpression {
                name: "offerer_expr".into(),
                expression: semabi_expr::parse("'offerer_' || offerer").unwrap(),
                result_type: None,
            },
            ItemExpression {
                name: "orderType_expr".into(),
                expression: semabi_expr::parse("order_parameters_orderType + 1").unwrap(),
                result_type: None,
            },
            ItemExpression {
                name: "orderType_expr_use".into(),
                expression: semabi_expr::parse("orderType_expr + 1").unwrap(),
                result_type: None,
            },
            ItemExpression {
                name: "order_parameters_orderType".into(),
                expression: semabi_expr::parse("5").unwrap(),
                result_type: None,
            },
        ],
    }
}

#[test]
fn order_parameters_concat_and_precedence_expressions_with_late_overwrite() {
    let item = fulfill_order_function();
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![item.clone()]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let selector = hex::decode(&item.hash()).unwrap();
    let mut calldata = selector;
    calldata.extend_from_slice(&word_be(0)); // order.parameters.orderType, inline
    calldata.extend_from_slice(&word_be(64)); // offerer offset, relative to the params region
    calldata.extend_from_slice(&string_tail("0xed7df606"));

    let trace = Trace {
        from: "0xfrom".into(),
        to: Some("0xseaport".into()),
        input: format!("0x{}", hex::encode(calldata)),
        output: None,
        error: None,
        value: BigInt::from(0),
        path: vec![],
    };
    let tx = Transaction {
        hash: "0xtx2".into(),
        from: "0xfrom".into(),
        to: Some("0xseaport".into()),
        input: "0x".into(),
        receipt: empty_receipt("0xtx2", vec![]),
        traces: vec![trace],
    };

    let rows = transformer.transform(&block(1, vec![tx]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("order_parameters_orderType"), Some(&Cell::Integer(BigInt::from(5))));
    assert_eq!(rows[0].get("offerer_expr"), Some(&Cell::String("offerer_0xed7df606".into())));
    assert_eq!(rows[0].get("orderType_expr"), Some(&Cell::Integer(BigInt::from(1))));
    assert_eq!(rows[0].get("orderType_expr_use"), Some(&Cell::Integer(BigInt::from(2))));
    assert_eq!(rows[0].get("transform_error"), Some(&Cell::Null));
}

fn fulfill_available_orders_function() -> SemanticAbiItem {
    let offerer = Parameter::new("offerer", ParamKind::Primitive(DataType::Address)).unwrap();
    let parameters = Parameter::new("parameters", ParamKind::Tuple(vec![offerer])).unwrap();
    let orders = Parameter::new("orders", ParamKind::Tuple(vec![parameters])).unwrap().arrayed(true, false);
    SemanticAbiItem {
        name: "fulfillAvailableOrders".into(),
        kind: ItemKind::Function,
        inputs: vec![SemanticParameter::from_raw(&orders)],
        outputs: vec![],
        is_primary: true,
        explode: vec!["orders.parameters.offerer".into()],
        matches: vec![],
        expressions: vec![],
    }
}

#[test]
fn exploding_orders_array_emits_one_row_per_offerer() {
    let item = fulfill_available_orders_function();
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![item.clone()]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let selector = hex::decode(&item.hash()).unwrap();
    let mut calldata = selector;
    calldata.extend_from_slice(&word_be(32)); // offset to the orders array
    calldata.extend_from_slice(&word_be(2)); // length
    calldata.extend_from_slice(&address_word(0x48));
    calldata.extend_from_slice(&address_word(0x2F));

    let trace = Trace {
        from: "0xfrom".into(),
        to: Some("0xseaport".into()),
        input: format!("0x{}", hex::encode(calldata)),
        output: None,
        error: None,
        value: BigInt::from(0),
        path: vec![],
    };
    let tx = Transaction {
        hash: "0xtx3".into(),
        from: "0xfrom".into(),
        to: Some("0xseaport".into()),
        input: "0x".into(),
        receipt: empty_receipt("0xtx3", vec![]),
        traces: vec![trace],
    };

    let rows = transformer.transform(&block(1, vec![tx]));
    assert_eq!(rows.len(), 2);
    let offerers: std::collections::HashSet<_> = rows.iter().map(|r| r.get("orders_parameters_offerer").cloned()).collect();
    assert!(offerers.contains(&Some(Cell::String(format!("0x{}", "48".repeat(20))))));
    assert!(offerers.contains(&Some(Cell::String(format!("0x{}", "2f".repeat(20))))));
    let indices: std::collections::HashSet<_> = rows.iter().map(|r| r.get("explodeIndex").cloned()).collect();
    assert_eq!(indices, [Some(Cell::Integer(BigInt::from(0))), Some(Cell::Integer(BigInt::from(1)))].into_iter().collect());
}

fn order_fulfilled_event() -> SemanticAbiItem {
    let offerer = Parameter::new("offerer", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    let recipient = Parameter::new("recipient", ParamKind::Primitive(DataType::Address)).unwrap().indexed(true);
    SemanticAbiItem {
        name: "OrderFulfilled".into(),
        kind: ItemKind::Event,
        inputs: vec![SemanticParameter::from_raw(&offerer), SemanticParameter::from_raw(&recipient)],
        outputs: vec![],
        is_primary: false,
        explode: vec![],
        matches: vec![],
        expressions: vec![],
    }
}

fn fulfill_available_advanced_orders_function(order_fulfilled_signature: String) -> SemanticAbiItem {
    let offerer = Parameter::new("offerer", ParamKind::Primitive(DataType::Address)).unwrap();
    SemanticAbiItem {
        name: "fulfillAvailableAdvancedOrders".into(),
        kind: ItemKind::Function,
        inputs: vec![SemanticParameter::from_raw(&offerer)],
        outputs: vec![],
        is_primary: true,
        explode: vec![],
        matches: vec![
            Match {
                signature: Some(order_fulfilled_signature),
                match_type: MatchType::Event,
                prefix: "fulfilled".into(),
                assert: MatchAssert::Many,
                predicates: vec![Predicate::Equal { source_col: "offerer".into(), matched_col: "offerer".into() }],
            },
            Match {
                signature: None,
                match_type: MatchType::Transfer,
                prefix: "transfer".into(),
                assert: MatchAssert::OnlyOne,
                predicates: vec![Predicate::Equal {
                    source_col: "fulfilled_recipient".into(),
                    matched_col: "toAddress".into(),
                }],
            },
        ],
        expressions: vec![],
    }
}

#[test]
fn order_fulfilled_many_match_then_transfer_match_tags_each_leg_erc721() {
    let order_fulfilled = order_fulfilled_event();
    let item = fulfill_available_advanced_orders_function(order_fulfilled.signature());
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![item.clone(), order_fulfilled.clone()]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let selector = hex::decode(&item.hash()).unwrap();
    let mut calldata = selector;
    calldata.extend_from_slice(&address_word(0xAA)); // offerer
    let trace = Trace {
        from: "0xfrom".into(),
        to: Some("0xseaport".into()),
        input: format!("0x{}", hex::encode(calldata)),
        output: None,
        error: None,
        value: BigInt::from(0),
        path: vec![],
    };

    let fulfilled_log = |recipient: u8| Log {
        address: "0xseaport".into(),
        topics: vec![format!("0x{}", order_fulfilled.hash()), address_topic(0xAA), address_topic(recipient)],
        data: "0x".into(),
        log_index: 0,
    };
    let erc721_transfer_log = |log_index: u64, to: u8, token_id: u64| Log {
        address: "0xtoken".into(),
        topics: vec![
            format!("0x{}", transfer_event().hash()),
            address_topic(0xAA),
            address_topic(to),
            format!("0x{}", hex::encode(word_be(token_id))),
        ],
        data: "0x".into(),
        log_index,
    };

    let logs = vec![fulfilled_log(0xBB), fulfilled_log(0xCC), erc721_transfer_log(1, 0xBB, 207), erc721_transfer_log(2, 0xCC, 6290)];
    let tx = Transaction {
        hash: "0xtx4".into(),
        from: "0xfrom".into(),
        to: Some("0xseaport".into()),
        input: "0x".into(),
        receipt: empty_receipt("0xtx4", logs),
        traces: vec![trace],
    };

    let rows = transformer.transform(&block(1, vec![tx]));
    assert_eq!(rows.len(), 2);
    let token_ids: std::collections::HashSet<_> = rows.iter().map(|r| r.get("transfer_tokenId").cloned()).collect();
    assert!(token_ids.contains(&Some(Cell::String("207".into()))));
    assert!(token_ids.contains(&Some(Cell::String("6290".into()))));
    for row in &rows {
        assert_eq!(row.get("transfer_tokenType"), Some(&Cell::String("Erc721".into())));
        assert_eq!(row.get("transform_error"), Some(&Cell::Null));
    }
}

#[test]
fn a_failed_match_still_emits_the_row_with_default_columns_and_the_latched_error() {
    let mut item = transfer_event();
    item.matches = vec![Match {
        signature: None,
        match_type: MatchType::Transfer,
        prefix: "native".into(),
        assert: MatchAssert::OnlyOne,
        predicates: vec![Predicate::Equal { source_col: "from".into(), matched_col: "toAddress".into() }],
    }];
    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![item.clone()]).unwrap();
    let transformer = Transformer::build(abi).unwrap();

    let log = Log {
        address: "0xtoken".into(),
        topics: vec![format!("0x{}", item.hash()), address_topic(0xAA), address_topic(0xBB)],
        data: format!("0x{}", uint_word(1)),
        log_index: 0,
    };
    let tx = Transaction {
        hash: "0xtx5".into(),
        from: "0xfrom".into(),
        to: Some("0xto".into()),
        input: "0x".into(),
        receipt: empty_receipt("0xtx5", vec![log]),
        traces: vec![],
    };

    let rows = transformer.transform(&block(7, vec![tx]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("transform_error"), Some(&Cell::String("match 'native': no match".into())));
    assert_eq!(rows[0].get("blockNumber"), Some(&Cell::Integer(BigInt::from(7))));
    assert_eq!(rows[0].get("transactionHash"), Some(&Cell::String("0xtx5".into())));
}

#[test]
fn schema_union_rejects_conflicting_parameters_start_time_types() {
    let start_time_long = Parameter::new("startTime", ParamKind::Primitive(DataType::Uint(64))).unwrap();
    let parameters_long = Parameter::new("parameters", ParamKind::Tuple(vec![start_time_long])).unwrap();
    let a = SemanticAbiItem {
        name: "OrderFulfilledA".into(),
        kind: ItemKind::Event,
        inputs: vec![SemanticParameter::from_raw(&parameters_long)],
        outputs: vec![],
        is_primary: true,
        explode: vec![],
        matches: vec![],
        expressions: vec![],
    };

    let mut b = a.clone();
    b.name = "OrderFulfilledB".into();
    b.expressions = vec![ItemExpression {
        name: "parameters_startTime".into(),
        expression: semabi_expr::parse("'late'").unwrap(),
        result_type: None,
    }];

    let abi = SemanticAbi::new(vec!["ethereum".into()], vec![], vec![], vec![a, b]).unwrap();
    let err = Transformer::build(abi).unwrap_err().to_string();
    assert!(err.contains("parameters_startTime"));
}
