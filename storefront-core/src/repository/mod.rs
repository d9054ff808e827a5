pub mod customer;
pub mod handlers;
pub mod invoice;
pub mod product;

pub use customer::CustomerRepository;
pub use invoice::InvoiceRepository;
pub use product::ProductRepository;

/// Builds a bound `LIKE` pattern matching `term` as a literal substring.
///
/// Used with `ESCAPE '\'`; the term is never spliced into SQL text.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
