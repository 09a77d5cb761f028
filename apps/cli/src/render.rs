//! Plain-text cart rendering.
//!
//! ```text
//! CART                                              3 items
//! ----------------------------------------------------------
//! #1    Tênis de Caminhada Leve Confortável   x2    $359.80
//! #3    Tênis VR Caminhada Confortável        x1    $139.90
//! ----------------------------------------------------------
//! TOTAL                                             $499.70
//! ```

use rocketshoes_cart::{Cart, LineItem};

const WIDTH: usize = 58;
const TITLE_WIDTH: usize = 34;

/// Renders the cart as a table, or a one-liner when empty.
pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let rule = "-".repeat(WIDTH);
    let count = format!("{} items", cart.total_quantity());

    let mut rows = Vec::with_capacity(cart.item_count() + 4);
    rows.push(format!("CART{count:>width$}", width = WIDTH - 4));
    rows.push(rule.clone());
    rows.extend(cart.items().iter().map(line));
    rows.push(rule);
    rows.push(format!(
        "TOTAL{total:>width$}",
        total = cart.total().to_string(),
        width = WIDTH - 5
    ));

    let mut out = rows.join("\n");
    out.push('\n');
    out
}

fn line(item: &LineItem) -> String {
    let id = format!("#{}", item.id);
    let amount = format!("x{}", item.amount);
    format!(
        "{id:<6}{title:<tw$}{amount:>5}{subtotal:>13}",
        title = truncate(&item.title, TITLE_WIDTH - 1),
        tw = TITLE_WIDTH,
        subtotal = item.subtotal().to_string(),
    )
}

/// Cuts `s` to `max` characters, marking the cut with `~`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
