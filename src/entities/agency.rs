// 🏦 Agency Entity - one row of the `agencias` feed
//
// Key: `codigo` (numeric). Clients point here through Client.agency_code.

use crate::decoder::{FeedKind, FeedRecord, RawRow};
use crate::locale::parse_integer;
use serde::{Deserialize, Serialize};

pub const COL_ID: &str = "id";
pub const COL_CODE: &str = "codigo";
pub const COL_NAME: &str = "nome";
pub const COL_ADDRESS: &str = "endereco";

/// Agency - bank branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub id: String,
    /// 0 when the cell is absent or not an integer
    pub code: i64,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl FeedRecord for Agency {
    const KIND: FeedKind = FeedKind::Agencies;

    fn required_columns() -> &'static [&'static [&'static str]] {
        &[&[COL_ID], &[COL_CODE]]
    }

    fn from_row(row: &RawRow) -> Self {
        Agency {
            id: row.text(COL_ID).unwrap_or_default(),
            code: parse_integer(row.get(COL_CODE)).unwrap_or(0),
            name: row.text(COL_NAME),
            address: row.text(COL_ADDRESS),
        }
    }
}
