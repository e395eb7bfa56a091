// 👤 Client Entity - one row of the `clientes` feed
//
// Identity: the feed's opaque `id`
// Join keys: `cpfCnpj` → Account.owner_tax_id, `codigoAgencia` → Agency.code
//
// Optional text stays `None` here; the view decides what "unavailable"
// looks like.

use crate::decoder::{FeedKind, FeedRecord, RawRow};
use crate::locale::{self, parse_currency, parse_date, parse_integer};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const COL_ID: &str = "id";
pub const COL_TAX_ID: &str = "cpfCnpj";
pub const COL_NATIONAL_ID: &str = "rg";
pub const COL_NAME: &str = "nome";
pub const COL_SOCIAL_NAME: &str = "nomeSocial";
pub const COL_BIRTH_DATE: &str = "dataNascimento";
pub const COL_MARITAL_STATUS: &str = "estadoCivil";
pub const COL_ANNUAL_INCOME: &str = "rendaAnual";
pub const COL_NET_WORTH: &str = "patrimonio";
pub const COL_AGENCY_CODE: &str = "codigoAgencia";
pub const COL_EMAIL: &str = "email";
pub const COL_ADDRESS: &str = "endereco";

/// Client - bank customer as published in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,

    /// Legal name; empty when the feed has none
    pub name: String,
    pub social_name: Option<String>,

    /// CPF (individuals) or CNPJ (organizations), verbatim from the feed
    pub tax_id: Option<String>,
    /// RG, used when there is no tax id
    pub national_id: Option<String>,

    pub email: Option<String>,
    /// 1900-01-01 when unknown
    pub birth_date: NaiveDate,
    pub marital_status: Option<String>,

    pub annual_income: f64,
    pub net_worth: f64,

    /// Agency code, 0 when absent
    pub agency_code: i64,
    pub address: Option<String>,
}

/// Document identifying a client, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityDocument<'a> {
    TaxId(&'a str),
    NationalId(&'a str),
}

impl Client {
    /// Name to show: social name first, then legal name
    pub fn display_name(&self) -> Option<&str> {
        self.social_name
            .as_deref()
            .or(Some(self.name.as_str()))
            .filter(|s| !s.is_empty())
    }

    pub fn identity_document(&self) -> Option<IdentityDocument<'_>> {
        self.tax_id
            .as_deref()
            .map(IdentityDocument::TaxId)
            .or_else(|| self.national_id.as_deref().map(IdentityDocument::NationalId))
    }

    /// Accounts can only be matched through the tax id
    pub fn can_match_accounts(&self) -> bool {
        self.tax_id.is_some()
    }

    pub fn has_known_birth_date(&self) -> bool {
        self.birth_date != locale::unknown_date()
    }

    /// Birth date as "dd/mm/yyyy", `None` when unknown
    pub fn birth_date_display(&self) -> Option<String> {
        locale::format_date(self.birth_date)
    }
}

impl FeedRecord for Client {
    const KIND: FeedKind = FeedKind::Clients;

    fn required_columns() -> &'static [&'static [&'static str]] {
        &[&[COL_ID], &[COL_TAX_ID, COL_NATIONAL_ID]]
    }

    fn from_row(row: &RawRow) -> Self {
        Client {
            id: row.text(COL_ID).unwrap_or_default(),
            name: row.text(COL_NAME).unwrap_or_default(),
            social_name: row.text(COL_SOCIAL_NAME),
            tax_id: row.text(COL_TAX_ID),
            national_id: row.text(COL_NATIONAL_ID),
            email: row.text(COL_EMAIL),
            birth_date: parse_date(row.get(COL_BIRTH_DATE)),
            marital_status: row.text(COL_MARITAL_STATUS),
            annual_income: parse_currency(row.get(COL_ANNUAL_INCOME)).unwrap_or(0.0),
            net_worth: parse_currency(row.get(COL_NET_WORTH)).unwrap_or(0.0),
            agency_code: parse_integer(row.get(COL_AGENCY_CODE)).unwrap_or(0),
            address: row.text(COL_ADDRESS),
        }
    }
}
