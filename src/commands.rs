use std::fmt::Write as _;

use crate::api::ConfigBackend;
use crate::config::Command;
use crate::core::PageController;
use crate::error::{AdminError, Result};
use crate::models::{ConfigRow, HistoryRow, RowKey};

/// 执行非交互子命令，输出写到 stdout
pub async fn run<B: ConfigBackend>(page: &mut PageController<B>, command: Command) -> Result<()> {
    match command {
        Command::Search(args) => {
            page.filter_mut().category = args.category;
            page.filter_mut().config_name = args.config_name;
            page.search().await?;
            print!("{}", format_config_rows(page.rows()));
            println!("Search Results: {}", page.rows().len());
            Ok(())
        }
        Command::Export(args) => {
            page.filter_mut().category = args.category;
            page.filter_mut().config_name = args.config_name;
            let path = page.download_excel().await?;
            println!("{}", path.display());
            Ok(())
        }
        Command::History(args) => {
            page.open_history(args.row_key()).await?;
            let history = page.history();
            println!("{}", history.title);
            print!("{}", format_history_rows(&history.rows));
            Ok(())
        }
        Command::Create(args) => {
            let form = page.create_form_mut();
            form.category = args.category;
            form.config_name = args.config_name;
            form.config_value = args.value;
            page.create().await?;
            println!("{}", page.message());
            Ok(())
        }
        Command::Set(args) => {
            let key = RowKey::new(args.category, args.config_name);
            page.filter_mut().category = key.category.clone();
            page.filter_mut().config_name = key.config_name.clone();
            page.search().await?;

            // 后台按模糊匹配查询，这里要求精确命中
            if !page.rows().iter().any(|r| r.key() == key) {
                return Err(AdminError::validation(format!(
                    "no entry {} / {}",
                    key.category, key.config_name
                )));
            }
            page.toggle_select(&key);
            page.set_edited(&key, args.value);
            page.save().await?;
            println!("{}", page.message());
            Ok(())
        }
    }
}

pub fn format_config_rows(rows: &[ConfigRow]) -> String {
    let cells: Vec<[&str; 3]> = rows
        .iter()
        .map(|r| {
            [
                r.category(),
                r.config_name(),
                r.config_value.as_deref().unwrap_or(""),
            ]
        })
        .collect();
    format_table(["Key Category", "Key Name", "Key Value"], &cells)
}

pub fn format_history_rows(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "No history\n".to_string();
    }
    let cells: Vec<[&str; 6]> = rows
        .iter()
        .map(|h| {
            [
                h.category(),
                h.config_name(),
                h.config_value(),
                h.action(),
                h.updated_date(),
                h.updated_by(),
            ]
        })
        .collect();
    format_table(
        ["Key Category", "Key Name", "Key Value", "Action", "Updated Date", "Updated By"],
        &cells,
    )
}

/// 按列宽左对齐输出，列间两个空格
fn format_table<const N: usize>(header: [&str; N], rows: &[[&str; N]]) -> String {
    let mut widths = header.map(|h| h.chars().count());
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in std::iter::once(&header).chain(rows) {
        let mut text = String::new();
        for (i, (cell, width)) in line.iter().zip(widths).enumerate() {
            if i > 0 {
                text.push_str("  ");
            }
            let _ = write!(text, "{:<width$}", cell, width = width);
        }
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}
