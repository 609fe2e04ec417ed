//! Plain-text rendering of catalog, cart, history and profile.

use std::fmt::Write;

use minishop_core::money::format_usd;
use minishop_core::{CartItem, Product, PurchaseHistoryEntry, StockLevel, UserProfile};
use rust_decimal::Decimal;

pub fn product_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found\n".to_string();
    }
    let mut out = String::new();
    for p in products {
        let _ = writeln!(
            out,
            "{:<12} {:<28} {:>10}  {}",
            p.id,
            p.name,
            format_usd(p.price),
            stock_badge(p.stock_level())
        );
        if !p.description.is_empty() {
            let _ = writeln!(out, "{:<12} {}", "", p.description);
        }
    }
    out
}

pub fn product_detail(p: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", p.name);
    if !p.description.is_empty() {
        let _ = writeln!(out, "{}", p.description);
    }
    let _ = writeln!(out, "Price: {}", format_usd(p.price));
    let _ = writeln!(out, "Stock: {}", p.quantity);
    if !p.image.is_empty() {
        let _ = writeln!(out, "Image: {}", p.image);
    }
    out
}

fn stock_badge(level: StockLevel) -> String {
    match level {
        StockLevel::Low(_) => format!("{} (low)", level.label()),
        StockLevel::OutOfStock | StockLevel::InStock(_) => level.label(),
    }
}

pub fn cart(items: &[CartItem], count: u64, total: Decimal) -> String {
    if items.is_empty() {
        return "Your cart is empty\nTotal: $0.00\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(
            out,
            "{:<12} {:<28} {} × {:<4} {:>10}",
            item.id,
            item.name,
            format_usd(item.price),
            item.qty,
            format_usd(item.line_total())
        );
    }
    let _ = writeln!(out, "Items: {count}");
    let _ = writeln!(out, "Total: {}", format_usd(total));
    out
}

pub fn history(entries: &[PurchaseHistoryEntry]) -> String {
    if entries.is_empty() {
        return "No purchases yet\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{} - Qty: {} - {}  ({})",
            entry.name,
            entry.qty,
            format_usd(entry.total),
            entry.date.format("%Y-%m-%d")
        );
    }
    out
}

pub fn profile(p: &UserProfile) -> String {
    format!(
        "Name:    {}\nEmail:   {}\nPhone:   {}\nAddress: {}\n",
        p.name, p.email, p.phone, p.address
    )
}
