//! Converts the wire block document (§6) — already-parsed `serde_json::Value` — into
//! the normalized [`crate::Block`]. Traces are accepted in either Erigon's flat
//! `traceAddress`-indexed shape or Geth's nested-`calls` shape and normalized into the
//! same flat [`Trace`] list.

use crate::block::{Block, BlockHeader, Log, Receipt, Transaction};
use crate::chain::EvmChain;
use crate::trace::Trace;
use crate::Error;
use num_bigint::BigInt;
use serde_json::Value;

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedDocument(msg.into())
}

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, Error> {
    value.get(name).ok_or_else(|| malformed(format!("missing '{name}'")))
}

fn as_str<'a>(value: &'a Value, name: &str) -> Result<&'a str, Error> {
    field(value, name)?.as_str().ok_or_else(|| malformed(format!("'{name}' must be a string")))
}

fn parse_hex_u64(raw: &str) -> Result<u64, Error> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16).map_err(|_| malformed(format!("'{raw}' is not a hex integer")))
}

fn parse_hex_bigint(raw: &str) -> Result<BigInt, Error> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(BigInt::from(0));
    }
    BigInt::parse_bytes(digits.as_bytes(), 16).ok_or_else(|| malformed(format!("'{raw}' is not a hex integer")))
}

fn opt_hex_u64(value: &Value, name: &str) -> Result<Option<u64>, Error> {
    match value.get(name).and_then(Value::as_str) {
        Some(raw) => Ok(Some(parse_hex_u64(raw)?)),
        None => Ok(None),
    }
}

fn parse_header(block: &Value) -> Result<BlockHeader, Error> {
    Ok(BlockHeader {
        number: parse_hex_u64(as_str(block, "number")?)?,
        timestamp: parse_hex_u64(as_str(block, "timestamp")?)?,
        hash: as_str(block, "hash")?.to_string(),
    })
}

fn parse_log(value: &Value) -> Result<Log, Error> {
    let topics = field(value, "topics")?
        .as_array()
        .ok_or_else(|| malformed("'topics' must be an array"))?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| malformed("'topics' must be an array of strings"))?;
    Ok(Log {
        address: as_str(value, "address")?.to_string(),
        topics,
        data: as_str(value, "data")?.to_string(),
        log_index: parse_hex_u64(as_str(value, "logIndex")?)?,
    })
}

fn parse_receipt(value: &Value) -> Result<Receipt, Error> {
    let logs = field(value, "logs")?
        .as_array()
        .ok_or_else(|| malformed("'logs' must be an array"))?
        .iter()
        .map(parse_log)
        .collect::<Result<Vec<_>, _>>()?;
    let status = opt_hex_u64(value, "status")?.map(|s| s as u8);
    Ok(Receipt {
        transaction_hash: as_str(value, "transactionHash")?.to_string(),
        status,
        gas_used: parse_hex_u64(as_str(value, "gasUsed")?)?,
        logs,
    })
}

fn parse_erigon_traces(traces: &[Value], tx_hash: &str) -> Result<Vec<Trace>, Error> {
    traces
        .iter()
        .filter(|t| t.get("transactionHash").and_then(Value::as_str) == Some(tx_hash))
        .map(|t| {
            let action = field(t, "action")?;
            let path = field(t, "traceAddress")?
                .as_array()
                .ok_or_else(|| malformed("'traceAddress' must be an array"))?
                .iter()
                .map(|v| v.as_u64().map(|n| n as usize))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| malformed("'traceAddress' must be an array of integers"))?;
            let error = t.get("error").and_then(Value::as_str).map(str::to_string);
            let to = action.get("to").and_then(Value::as_str).map(str::to_string);
            let to = if error.is_some() && to.is_none() {
                Some("0x0000000000000000000000000000000000000000".to_string())
            } else {
                to
            };
            Ok(Trace {
                from: as_str(action, "from")?.to_string(),
                to,
                input: action.get("input").and_then(Value::as_str).unwrap_or("0x").to_string(),
                output: t
                    .get("result")
                    .and_then(|r| r.get("output"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                error,
                value: action
                    .get("value")
                    .and_then(Value::as_str)
                    .map(parse_hex_bigint)
                    .transpose()?
                    .unwrap_or_else(|| BigInt::from(0)),
                path,
            })
        })
        .collect()
}

fn parse_geth_calls(node: &Value, path: &mut Vec<usize>, out: &mut Vec<Trace>) -> Result<(), Error> {
    let value = node
        .get("value")
        .and_then(Value::as_str)
        .map(parse_hex_bigint)
        .transpose()?
        .unwrap_or_else(|| BigInt::from(0));
    out.push(Trace {
        from: as_str(node, "from")?.to_string(),
        to: node.get("to").and_then(Value::as_str).map(str::to_string),
        input: node.get("input").and_then(Value::as_str).unwrap_or("0x").to_string(),
        output: node.get("output").and_then(Value::as_str).map(str::to_string),
        error: node.get("error").and_then(Value::as_str).map(str::to_string),
        value,
        path: path.clone(),
    });
    if let Some(calls) = node.get("calls").and_then(Value::as_array) {
        for (i, call) in calls.iter().enumerate() {
            path.push(i);
            parse_geth_calls(call, path, out)?;
            path.pop();
        }
    }
    Ok(())
}

fn parse_geth_trace_for_tx(root: &Value) -> Result<Vec<Trace>, Error> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    parse_geth_calls(root, &mut path, &mut out)?;
    Ok(out)
}

enum RawTraces<'a> {
    Erigon(&'a [Value]),
    Geth(&'a [Value]),
}

fn classify_traces(traces: &Value) -> Result<RawTraces<'_>, Error> {
    let arr = traces.as_array().ok_or_else(|| malformed("'traces' must be an array"))?;
    match arr.first() {
        Some(first) if first.get("traceAddress").is_some() => Ok(RawTraces::Erigon(arr)),
        _ => Ok(RawTraces::Geth(arr)),
    }
}

/// Parses a full block document into a [`Block`] for the given chain (the chain tag
/// itself is supplied out-of-band, as the wire document never names it — it is the
/// caller's integration context, e.g. which RPC endpoint the block was fetched from).
pub fn parse_block_document(document: &Value, chain: EvmChain) -> Result<Block, Error> {
    let block = field(document, "block")?;
    let header = parse_header(block)?;

    let raw_transactions = field(block, "transactions")?
        .as_array()
        .ok_or_else(|| malformed("'transactions' must be an array"))?;
    let raw_receipts = field(document, "receipts")?
        .as_array()
        .ok_or_else(|| malformed("'receipts' must be an array"))?;
    if raw_transactions.len() != raw_receipts.len() {
        return Err(malformed("'transactions' and 'receipts' must be the same length"));
    }
    let traces_value = field(document, "traces")?;
    let classified = classify_traces(traces_value)?;

    let mut transactions = Vec::with_capacity(raw_transactions.len());
    for (idx, (raw_tx, raw_receipt)) in raw_transactions.iter().zip(raw_receipts.iter()).enumerate() {
        let hash = as_str(raw_tx, "hash")?.to_string();
        let receipt = parse_receipt(raw_receipt)?;
        if receipt.transaction_hash != hash {
            return Err(Error::ReceiptMismatch {
                expected: hash,
                actual: receipt.transaction_hash,
            });
        }
        let traces = match classified {
            RawTraces::Erigon(all) => parse_erigon_traces(all, &hash)?,
            RawTraces::Geth(all) => {
                let root = all
                    .get(idx)
                    .ok_or_else(|| malformed("geth traces array shorter than transactions"))?;
                parse_geth_trace_for_tx(root)?
            }
        };
        transactions.push(Transaction {
            hash,
            from: as_str(raw_tx, "from")?.to_string(),
            to: raw_tx.get("to").and_then(Value::as_str).map(str::to_string),
            input: raw_tx.get("input").and_then(Value::as_str).unwrap_or("0x").to_string(),
            receipt,
            traces,
        });
    }

    Ok(Block { chain, header, transactions })
}
