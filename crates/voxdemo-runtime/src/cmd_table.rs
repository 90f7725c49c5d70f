//! `voxdemo table`: print the lifecycle transition table.

use voxdemo_core::EventTag;

/// One row per event tag: accepted-from statuses and the resulting status.
pub fn table_rows() -> Vec<String> {
    EventTag::ALL
        .iter()
        .map(|tag| {
            let from = match tag.valid_from() {
                Some(statuses) => statuses
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                None => "*".to_string(),
            };
            let to = tag.target().map_or("(context only)", |s| s.as_str());
            format!("{:<18} {from:<32} -> {to}", tag.as_str())
        })
        .collect()
}

/// Entry point for `voxdemo table`.
pub fn cmd_table() {
    println!("{:<18} {:<32}    {}", "EVENT", "FROM", "TO");
    for row in table_rows() {
        println!("{row}");
    }
}
