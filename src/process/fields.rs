// src/process/fields.rs
use crate::decode::{Cell, RawRow};

/// A logical column of the service table and the header spellings it may appear under.
///
/// `groups` is consulted in order; the first group that finds a value wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub name: &'static str,
    pub groups: &'static [&'static [&'static str]],
}

pub const ENTRY_DATE: FieldAliases = FieldAliases {
    name: "date",
    groups: &[&["data_entrada", "data entrada"], &["data", "date"]],
};

pub const COMPLETION_DATE: FieldAliases = FieldAliases {
    name: "completion_date",
    groups: &[&["data_fim", "data fim", "data_saida", "completion_date"]],
};

pub const SERVICE_TYPE: FieldAliases = FieldAliases {
    name: "type",
    groups: &[&["tipo", "type", "serviço", "service"]],
};

pub const VALUE: FieldAliases = FieldAliases {
    name: "value",
    groups: &[&["valor", "value", "preço", "price"]],
};

pub const PLATE: FieldAliases = FieldAliases {
    name: "plate",
    groups: &[&["placa", "plate"]],
};

pub const MODEL: FieldAliases = FieldAliases {
    name: "model",
    groups: &[&["modelo", "model", "veículo", "vehicle"]],
};

pub const OWNER: FieldAliases = FieldAliases {
    name: "owner",
    groups: &[&["proprietário", "owner", "cliente final"]],
};

pub const CLIENT: FieldAliases = FieldAliases {
    name: "client",
    groups: &[&["cliente", "client", "loja", "store"]],
};

pub const DISPATCHER: FieldAliases = FieldAliases {
    name: "dispatcher",
    groups: &[&["despachante", "dispatcher"]],
};

impl FieldAliases {
    pub fn lookup<'a>(&self, row: &'a RawRow) -> Option<&'a Cell> {
        self.groups.iter().find_map(|aliases| get_field(row, aliases))
    }
}

/// First cell, in column order, whose trimmed lower-cased header equals one of `aliases`.
/// Aliases are expected in lower case already.
pub fn get_field<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a Cell> {
    row.iter()
        .find(|(header, cell)| {
            if cell.is_empty() {
                return false;
            }
            let key = header.trim().to_lowercase();
            aliases.iter().any(|a| key == *a)
        })
        .map(|(_, cell)| cell)
}
