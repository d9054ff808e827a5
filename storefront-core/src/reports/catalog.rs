use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a report binds as its single SQL parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportParam {
    /// No parameter
    None,

    /// A caller-supplied `YYYY-MM` month token
    Month,

    /// A cutoff timestamp this many days before now
    SinceDays(i64),
}

/// The canned reports, numbered 1-20 as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    ProductQuantities,
    BestSellingProducts,
    CustomerSpending,
    HighSpendingCustomers,
    LargeInvoices,
    SlowSellingProducts,
    TopProductsByRevenue,
    TopCustomers,
    LowStock,
    MonthlyProductSales,
    MonthlyCustomerSpending,
    InvoicesWithManyLines,
    RarelySoldProducts,
    CustomerUnitsBought,
    FrequentCustomers,
    HighRevenueProducts,
    RecentCustomerSpending,
    MediumStock,
    InactiveCustomers,
    DailyProductSales,
}

impl Report {
    pub const ALL: [Report; 20] = [
        Report::ProductQuantities,
        Report::BestSellingProducts,
        Report::CustomerSpending,
        Report::HighSpendingCustomers,
        Report::LargeInvoices,
        Report::SlowSellingProducts,
        Report::TopProductsByRevenue,
        Report::TopCustomers,
        Report::LowStock,
        Report::MonthlyProductSales,
        Report::MonthlyCustomerSpending,
        Report::InvoicesWithManyLines,
        Report::RarelySoldProducts,
        Report::CustomerUnitsBought,
        Report::FrequentCustomers,
        Report::HighRevenueProducts,
        Report::RecentCustomerSpending,
        Report::MediumStock,
        Report::InactiveCustomers,
        Report::DailyProductSales,
    ];

    /// 1-based number used by the shell and the CLI.
    pub fn id(self) -> u8 {
        Report::ALL
            .iter()
            .position(|r| *r == self)
            .map_or(0, |i| i as u8 + 1)
    }

    pub fn from_id(id: u8) -> Option<Report> {
        let index = usize::from(id).checked_sub(1)?;
        Report::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Report::ProductQuantities => "Quantity sold per product",
            Report::BestSellingProducts => "Products with more than 10 units sold",
            Report::CustomerSpending => "Amount spent per customer",
            Report::HighSpendingCustomers => "Customers who spent more than 500",
            Report::LargeInvoices => "Invoices above 1000",
            Report::SlowSellingProducts => "Products with fewer than 5 units sold",
            Report::TopProductsByRevenue => "Top 5 products by revenue",
            Report::TopCustomers => "Top 5 customers by amount spent",
            Report::LowStock => "Products with stock below 5",
            Report::MonthlyProductSales => "Quantity sold per product in month",
            Report::MonthlyCustomerSpending => "Amount spent per customer in month",
            Report::InvoicesWithManyLines => "Invoices with more than 5 lines",
            Report::RarelySoldProducts => "Products sold on fewer than 3 invoices",
            Report::CustomerUnitsBought => "Units bought per customer",
            Report::FrequentCustomers => "Customers with more than 3 invoices",
            Report::HighRevenueProducts => "Products with revenue above 500",
            Report::RecentCustomerSpending => "Amount spent per customer in the last 90 days",
            Report::MediumStock => "Products with stock between 5 and 10",
            Report::InactiveCustomers => "Customers without purchases in the last 30 days",
            Report::DailyProductSales => "Daily quantity sold per product",
        }
    }

    pub fn param(self) -> ReportParam {
        match self {
            Report::MonthlyProductSales | Report::MonthlyCustomerSpending => ReportParam::Month,
            Report::RecentCustomerSpending => ReportParam::SinceDays(90),
            Report::InactiveCustomers => ReportParam::SinceDays(30),
            _ => ReportParam::None,
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Report::ProductQuantities
            | Report::BestSellingProducts
            | Report::SlowSellingProducts
            | Report::MonthlyProductSales => &["product_name", "total_quantity"],
            Report::CustomerSpending
            | Report::HighSpendingCustomers
            | Report::TopCustomers
            | Report::MonthlyCustomerSpending
            | Report::RecentCustomerSpending => &["customer_name", "total_spent"],
            Report::LargeInvoices => &["invoice_id", "customer_name", "total_amount"],
            Report::TopProductsByRevenue | Report::HighRevenueProducts => {
                &["product_name", "total_revenue"]
            }
            Report::LowStock | Report::MediumStock => &["product_name", "stock"],
            Report::InvoicesWithManyLines => &["invoice_id", "item_count"],
            Report::RarelySoldProducts => &["product_name", "sale_count"],
            Report::CustomerUnitsBought => &["customer_name", "total_items"],
            Report::FrequentCustomers => &["customer_name", "invoice_count"],
            Report::InactiveCustomers => &["customer_name"],
            Report::DailyProductSales => &["sale_date", "product_name", "daily_quantity"],
        }
    }

    /// The report's query. Column order matches [`Report::columns`]; a `?`
    /// appears only when [`Report::param`] is not `None`.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Report::ProductQuantities => {
                r#"
                SELECT p.name AS product_name, SUM(ii.quantity) AS total_quantity
                FROM invoice_items ii
                JOIN products p ON ii.product_id = p.product_id
                GROUP BY p.name
                ORDER BY total_quantity DESC, product_name
                "#
            }
            Report::BestSellingProducts => {
                r#"
                SELECT p.name AS product_name, SUM(ii.quantity) AS total_quantity
                FROM invoice_items ii
                JOIN products p ON ii.product_id = p.product_id
                GROUP BY p.name
                HAVING total_quantity > 10
                ORDER BY total_quantity DESC, product_name
                "#
            }
            Report::CustomerSpending => {
                r#"
                SELECT c.name AS customer_name, SUM(i.total_amount) AS total_spent
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                GROUP BY c.name
                ORDER BY total_spent DESC, customer_name
                "#
            }
            Report::HighSpendingCustomers => {
                r#"
                SELECT c.name AS customer_name, SUM(i.total_amount) AS total_spent
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                GROUP BY c.name
                HAVING total_spent > 500
                ORDER BY total_spent DESC, customer_name
                "#
            }
            Report::LargeInvoices => {
                r#"
                SELECT i.invoice_id, c.name AS customer_name, i.total_amount
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                WHERE i.total_amount > 1000
                ORDER BY i.total_amount DESC, i.invoice_id
                "#
            }
            Report::SlowSellingProducts => {
                r#"
                SELECT p.name AS product_name, SUM(ii.quantity) AS total_quantity
                FROM invoice_items ii
                JOIN products p ON ii.product_id = p.product_id
                GROUP BY p.name
                HAVING total_quantity < 5
                ORDER BY total_quantity ASC, product_name
                "#
            }
            Report::TopProductsByRevenue => {
                r#"
                SELECT ii.product_name, SUM(ii.subtotal) AS total_revenue
                FROM invoice_items ii
                GROUP BY ii.product_name
                ORDER BY total_revenue DESC, ii.product_name
                LIMIT 5
                "#
            }
            Report::TopCustomers => {
                r#"
                SELECT c.name AS customer_name, SUM(i.total_amount) AS total_spent
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                GROUP BY c.name
                ORDER BY total_spent DESC, customer_name
                LIMIT 5
                "#
            }
            Report::LowStock => {
                "SELECT name AS product_name, stock FROM products WHERE stock < 5 ORDER BY stock ASC, name"
            }
            Report::MonthlyProductSales => {
                r#"
                SELECT ii.product_name, SUM(ii.quantity) AS total_quantity
                FROM invoice_items ii
                JOIN invoices i ON ii.invoice_id = i.invoice_id
                WHERE STRFTIME('%Y-%m', i.date) = ?
                GROUP BY ii.product_name
                ORDER BY total_quantity DESC, ii.product_name
                "#
            }
            Report::MonthlyCustomerSpending => {
                r#"
                SELECT c.name AS customer_name, SUM(i.total_amount) AS total_spent
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                WHERE STRFTIME('%Y-%m', i.date) = ?
                GROUP BY c.name
                ORDER BY total_spent DESC, customer_name
                "#
            }
            Report::InvoicesWithManyLines => {
                r#"
                SELECT invoice_id, COUNT(item_id) AS item_count
                FROM invoice_items
                GROUP BY invoice_id
                HAVING item_count > 5
                ORDER BY item_count DESC, invoice_id
                "#
            }
            Report::RarelySoldProducts => {
                r#"
                SELECT product_name, COUNT(DISTINCT invoice_id) AS sale_count
                FROM invoice_items
                GROUP BY product_name
                HAVING sale_count < 3
                ORDER BY sale_count ASC, product_name
                "#
            }
            Report::CustomerUnitsBought => {
                r#"
                SELECT c.name AS customer_name, SUM(ii.quantity) AS total_items
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                JOIN invoice_items ii ON i.invoice_id = ii.invoice_id
                GROUP BY c.name
                ORDER BY total_items DESC, customer_name
                "#
            }
            Report::FrequentCustomers => {
                r#"
                SELECT c.name AS customer_name, COUNT(i.invoice_id) AS invoice_count
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                GROUP BY c.name
                HAVING invoice_count > 3
                ORDER BY invoice_count DESC, customer_name
                "#
            }
            Report::HighRevenueProducts => {
                r#"
                SELECT product_name, SUM(subtotal) AS total_revenue
                FROM invoice_items
                GROUP BY product_name
                HAVING total_revenue > 500
                ORDER BY total_revenue DESC, product_name
                "#
            }
            Report::RecentCustomerSpending => {
                r#"
                SELECT c.name AS customer_name, SUM(i.total_amount) AS total_spent
                FROM invoices i
                JOIN customers c ON i.customer_id = c.customer_id
                WHERE i.date >= ?
                GROUP BY c.name
                ORDER BY total_spent DESC, customer_name
                "#
            }
            Report::MediumStock => {
                "SELECT name AS product_name, stock FROM products WHERE stock BETWEEN 5 AND 10 ORDER BY stock ASC, name"
            }
            Report::InactiveCustomers => {
                r#"
                SELECT name AS customer_name
                FROM customers
                WHERE customer_id NOT IN (
                    SELECT DISTINCT customer_id FROM invoices WHERE date >= ?
                )
                ORDER BY name
                "#
            }
            Report::DailyProductSales => {
                r#"
                SELECT STRFTIME('%Y-%m-%d', i.date) AS sale_date, ii.product_name,
                       SUM(ii.quantity) AS daily_quantity
                FROM invoice_items ii
                JOIN invoices i ON ii.invoice_id = i.invoice_id
                GROUP BY sale_date, ii.product_name
                ORDER BY sale_date DESC, daily_quantity DESC, ii.product_name
                "#
            }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.id(), self.title())
    }
}

impl FromStr for Report {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Report::from_id)
            .ok_or_else(|| format!("unknown report {:?}, expected 1-20", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_one_based_and_roundtrip() {
        for (index, report) in Report::ALL.iter().enumerate() {
            assert_eq!(report.id() as usize, index + 1);
            assert_eq!(Report::from_id(report.id()), Some(*report));
        }
        assert_eq!(Report::from_id(0), None);
        assert_eq!(Report::from_id(21), None);
    }

    #[test]
    fn test_placeholder_only_when_parameterized() {
        for report in Report::ALL {
            let has_placeholder = report.sql().contains('?');
            assert_eq!(
                has_placeholder,
                report.param() != ReportParam::None,
                "report {}",
                report
            );
        }
    }

    #[test]
    fn test_parse_report_number() {
        assert_eq!("10".parse::<Report>(), Ok(Report::MonthlyProductSales));
        assert!("abc".parse::<Report>().is_err());
        assert!("0".parse::<Report>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Report::LowStock.to_string(), "9. Products with stock below 5");
    }
}
