//! TokenTransferStep (§4.4, C8): the sibling schema and candidate rows a `transfer`
//! match draws from — `transaction.transfers()` read straight through, one row per
//! decoded transfer.

use crate::leaf::default_column;
use crate::row::Row;
use semabi_abi::parameter::DataType;
use semabi_codec::{AnalyticalType, Cell, DatasetColumn, StorageType};
use semabi_metadata::{Transaction, Transfer};

pub fn schema() -> Vec<DatasetColumn> {
    vec![
        default_column("fromAddress", DataType::Address),
        default_column("toAddress", DataType::Address),
        default_column("value", DataType::Uint(256)),
        DatasetColumn::new("tokenId", StorageType::String, AnalyticalType::Dimension),
        DatasetColumn::new("tokenType", StorageType::String, AnalyticalType::Dimension).non_nullable(),
    ]
}

fn row_for(transfer: &Transfer) -> Row {
    let mut row = Row::new();
    row.insert("fromAddress".into(), Cell::Hex(transfer.from_address.clone()));
    row.insert("toAddress".into(), Cell::Hex(transfer.to_address.clone()));
    row.insert("value".into(), Cell::Integer(transfer.value.clone()));
    row.insert(
        "tokenId".into(),
        transfer.token_id.clone().map(Cell::String).unwrap_or(Cell::Null),
    );
    row.insert("tokenType".into(), Cell::String(transfer.token_type.as_str().to_string()));
    row
}

/// Candidate rows for a `transfer` match: every decoded transfer in the transaction,
/// in log order. `MatchStep` filters these with the match's predicates exactly as it
/// would a sibling event/function pipeline's rows.
pub fn candidate_rows(transaction: &Transaction) -> Vec<Row> {
    transaction.transfers().iter().map(row_for).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semabi_metadata::TokenType;

    #[test]
    fn builds_one_row_per_transfer() {
        let transfer = Transfer {
            from_address: "aa".repeat(20),
            to_address: "bb".repeat(20),
            value: num_bigint::BigInt::from(42),
            token_id: Some("7".into()),
            token_type: TokenType::Erc1155,
            internal_index: "3".into(),
        };
        let row = row_for(&transfer);
        assert_eq!(row.get("fromAddress"), Some(&Cell::Hex("aa".repeat(20))));
        assert_eq!(row.get("tokenId"), Some(&Cell::String("7".into())));
        assert_eq!(row.get("tokenType"), Some(&Cell::String("Erc1155".into())));
    }
}
