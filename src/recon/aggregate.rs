use crate::model::columns::{
    AMOUNT, BUYING_AMT_AI, COMMISSION, DATE, ORDER_TYPE, PAX_SOLD, PIVOT_KEY_COLUMNS, RATE,
    SELLING_AMOUNT,
};
use crate::model::{Row, Table, Value};
use crate::recon::{Diagnostics, RowFault, RunOptions};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Order types counted as regular business.
pub const REGULAR_ORDER_TYPES: [&str; 5] = [
    "regular",
    "smartq-pop-up",
    "food trial",
    "regular-pop-up",
    "tuckshop",
];

/// Order types counted as events.
pub const EVENT_ORDER_TYPES: [&str; 3] = ["event", "event pop-up", "adhoc"];

/// The aggregation bucket of a row, decided by its `order type`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBucket {
    Regular,
    Event,
    /// Any other order type, or none. These rows only count towards grand totals.
    Unclassified,
}

impl OrderBucket {
    /// Matches `order_type` case-insensitively against the known order types.
    pub fn classify(order_type: &Value) -> Self {
        let Value::Text(order_type) = order_type else {
            return OrderBucket::Unclassified;
        };
        let order_type = order_type.to_lowercase();
        if REGULAR_ORDER_TYPES.contains(&order_type.as_str()) {
            OrderBucket::Regular
        } else if EVENT_ORDER_TYPES.contains(&order_type.as_str()) {
            OrderBucket::Event
        } else {
            OrderBucket::Unclassified
        }
    }
}

/// Buying and selling sums over the rows of one bucket.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct BucketTotals {
    buying_amt_ai: Decimal,
    selling_amount: Decimal,
}

impl BucketTotals {
    pub fn buying_amt_ai(&self) -> Decimal {
        self.buying_amt_ai
    }

    pub fn selling_amount(&self) -> Decimal {
        self.selling_amount
    }

    fn with_row(self, row: &Row) -> Result<BucketTotals, RowFault> {
        Ok(BucketTotals {
            buying_amt_ai: add(self.buying_amt_ai, row, BUYING_AMT_AI)?,
            selling_amount: add(self.selling_amount, row, SELLING_AMOUNT)?,
        })
    }

    fn plus(self, other: BucketTotals) -> Option<BucketTotals> {
        Some(BucketTotals {
            buying_amt_ai: self.buying_amt_ai.checked_add(other.buying_amt_ai)?,
            selling_amount: self.selling_amount.checked_add(other.selling_amount)?,
        })
    }
}

/// Adds the `column` cell of `row` to `total`.
fn add(total: Decimal, row: &Row, column: &'static str) -> Result<Decimal, RowFault> {
    total
        .checked_add(row.number(column))
        .ok_or(RowFault::TotalOverflow(column))
}

/// Totals over a whole month of a sheet.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct AggregateSummary {
    /// Distinct dates on which something was sold.
    number_of_days: usize,
    regular: BucketTotals,
    event: BucketTotals,
    unclassified: BucketTotals,
    commission: Decimal,
    amount: Decimal,
}

impl AggregateSummary {
    pub fn number_of_days(&self) -> usize {
        self.number_of_days
    }

    pub fn bucket(&self, bucket: OrderBucket) -> BucketTotals {
        match bucket {
            OrderBucket::Regular => self.regular,
            OrderBucket::Event => self.event,
            OrderBucket::Unclassified => self.unclassified,
        }
    }

    /// Buying and selling sums over every row, whatever its bucket. `None` if a sum is too large.
    pub fn total(&self) -> Option<BucketTotals> {
        self.regular.plus(self.event)?.plus(self.unclassified)
    }

    pub fn commission(&self) -> Decimal {
        self.commission
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The summary as named metrics, in display order.
    pub fn metrics(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("Number of Days", Decimal::from(self.number_of_days)),
            ("Buying Amt AI (Regular)", self.regular.buying_amt_ai),
            ("Selling Amt (Regular)", self.regular.selling_amount),
            ("Buying Amt AI (Event)", self.event.buying_amt_ai),
            ("Selling Amt (Event)", self.event.selling_amount),
            ("Commission", self.commission),
            ("Amount", self.amount),
        ]
    }

    /// The summary with `row` added, or the fault if a sum would overflow.
    fn with_row(&self, row: &Row) -> Result<AggregateSummary, RowFault> {
        let mut next = self.clone();
        match OrderBucket::classify(row.get(ORDER_TYPE)) {
            OrderBucket::Regular => next.regular = self.regular.with_row(row)?,
            OrderBucket::Event => next.event = self.event.with_row(row)?,
            OrderBucket::Unclassified => next.unclassified = self.unclassified.with_row(row)?,
        }
        next.commission = add(self.commission, row, COMMISSION)?;
        next.amount = add(self.amount, row, AMOUNT)?;
        Ok(next)
    }
}

/// Sums buying and selling amounts per order bucket, sums commission and amount over all rows,
/// and counts the distinct non-blank dates of rows with `pax sold > 0`.
///
/// A row that would overflow any sum is left out of the summary entirely, and an error is added
/// to `diagnostics`.
pub fn calculate_aggregates(
    table: &Table,
    options: &RunOptions,
    diagnostics: &mut Diagnostics,
) -> AggregateSummary {
    let mut summary = AggregateSummary::default();
    let mut active_dates: HashSet<&Value> = HashSet::new();

    for row in table.rows() {
        summary = match summary.with_row(row) {
            Ok(next) => next,
            Err(fault) => {
                let position = options.display_position(row.index());
                diagnostics.error(
                    Some(position),
                    format!("Error processing row {position}: {fault}"),
                );
                continue;
            }
        };

        let date = row.get(DATE);
        if row.number(PAX_SOLD) > Decimal::ZERO && !date.is_empty() {
            let _ = active_dates.insert(date);
        }
    }

    summary.number_of_days = active_dates.len();
    summary
}

/// Identifies one pivot group: site name, vendor, session, meal type and order type.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct PivotKey {
    site_name: String,
    vendor: String,
    session: String,
    meal_type: String,
    order_type: String,
}

impl PivotKey {
    /// Returns `None` if any of the key columns is blank.
    fn from_row(row: &Row) -> Option<Self> {
        let [site_name, vendor, session, meal_type, order_type] =
            PIVOT_KEY_COLUMNS.map(|column| row.get(column));
        if [site_name, vendor, session, meal_type, order_type]
            .iter()
            .any(|v| v.is_empty())
        {
            return None;
        }
        Some(Self {
            site_name: site_name.to_string(),
            vendor: vendor.to_string(),
            session: session.to_string(),
            meal_type: meal_type.to_string(),
            order_type: order_type.to_string(),
        })
    }

    /// The key values in the order of `PIVOT_KEY_COLUMNS`.
    pub fn values(&self) -> [&str; 5] {
        [
            &self.site_name,
            &self.vendor,
            &self.session,
            &self.meal_type,
            &self.order_type,
        ]
    }
}

/// A row of the average price pivot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PivotRow {
    key: PivotKey,
    /// Number of rows in the group.
    days: usize,
    /// Mean of the numeric `rate` cells in the group, `None` if there are none.
    average_selling_price: Option<Decimal>,
}

impl PivotRow {
    pub fn key(&self) -> &PivotKey {
        &self.key
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn average_selling_price(&self) -> Option<Decimal> {
        self.average_selling_price
    }
}

/// Groups rows by `PivotKey`, counting the rows and averaging `rate` per group. Rows with a blank
/// key column are left out. Groups are returned in key order.
///
/// If the rates of a group are too large to sum, the group has no average and an error is added
/// to `diagnostics` for the row where the sum overflowed.
pub fn pivot_average_prices(
    table: &Table,
    options: &RunOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<PivotRow> {
    let mut days: BTreeMap<PivotKey, usize> = BTreeMap::new();
    // `None` once the sum has overflowed
    let mut rates: BTreeMap<PivotKey, (Option<Decimal>, usize)> = BTreeMap::new();

    for row in table.rows() {
        let Some(key) = PivotKey::from_row(row) else {
            continue;
        };
        *days.entry(key.clone()).or_default() += 1;
        let (sum, count) = rates.entry(key).or_insert((Some(Decimal::ZERO), 0));
        let (Some(rate), Some(total)) = (row.get(RATE).as_number(), *sum) else {
            continue;
        };
        *sum = total.checked_add(rate);
        *count += 1;
        if sum.is_none() {
            let position = options.display_position(row.index());
            let fault = RowFault::TotalOverflow(RATE);
            diagnostics.error(
                Some(position),
                format!("Error processing row {position}: {fault}"),
            );
        }
    }

    days.into_iter()
        .map(|(key, days)| {
            let average_selling_price = rates
                .get(&key)
                .and_then(|&(sum, count)| sum.and_then(|sum| mean(sum, count)));
            PivotRow {
                key,
                days,
                average_selling_price,
            }
        })
        .collect()
}

fn mean(sum: Decimal, count: usize) -> Option<Decimal> {
    if count == 0 {
        return None;
    }
    sum.checked_div(Decimal::from(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{dec, TableBuilder};

    fn aggregates(table: &Table) -> AggregateSummary {
        calculate_aggregates(table, &RunOptions::default(), &mut Diagnostics::new())
    }

    fn pivot(table: &Table) -> Vec<PivotRow> {
        pivot_average_prices(table, &RunOptions::default(), &mut Diagnostics::new())
    }

    fn sale(date: &str, order_type: &str, buying: &str, selling: &str, pax: &str) -> Row {
        Row::new(0)
            .with("date", date)
            .with("order type", order_type)
            .with("buying amt ai", dec(buying))
            .with("selling amount", dec(selling))
            .with("pax sold", dec(pax))
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            OrderBucket::classify(&Value::text("tuckshop")),
            OrderBucket::Regular
        );
        assert_eq!(
            OrderBucket::classify(&Value::text("Event Pop-Up")),
            OrderBucket::Event
        );
        assert_eq!(
            OrderBucket::classify(&Value::text("adhoc")),
            OrderBucket::Event
        );
        assert_eq!(
            OrderBucket::classify(&Value::text("event popup")),
            OrderBucket::Unclassified
        );
        assert_eq!(
            OrderBucket::classify(&Value::number(1)),
            OrderBucket::Unclassified
        );
        assert_eq!(OrderBucket::classify(&Value::Empty), OrderBucket::Unclassified);
    }

    #[test]
    fn test_bucket_sums_are_disjoint_and_additive() {
        let table = TableBuilder::new()
            .row(sale("d1", "regular", "90", "100", "10"))
            .row(sale("d1", "food trial", "45", "50", "5"))
            .row(sale("d2", "event", "180", "200", "20"))
            .row(sale("d3", "staff meal", "9", "10", "1"))
            .row(Row::new(0).with("date", "d4").with("selling amount", dec("7")))
            .build();
        let summary = aggregates(&table);

        let regular = summary.bucket(OrderBucket::Regular);
        assert_eq!(regular.buying_amt_ai(), dec("135"));
        assert_eq!(regular.selling_amount(), dec("150"));

        let event = summary.bucket(OrderBucket::Event);
        assert_eq!(event.buying_amt_ai(), dec("180"));
        assert_eq!(event.selling_amount(), dec("200"));

        let unclassified = summary.bucket(OrderBucket::Unclassified);
        assert_eq!(unclassified.selling_amount(), dec("17"));

        let total = summary.total().unwrap();
        assert_eq!(total.buying_amt_ai(), dec("324"));
        assert_eq!(total.selling_amount(), dec("367"));
        assert_eq!(
            regular.selling_amount() + event.selling_amount() + unclassified.selling_amount(),
            total.selling_amount()
        );
    }

    #[test]
    fn test_grand_totals_include_every_row() {
        let table = TableBuilder::new()
            .row(Row::new(0).with("order type", "regular").with("commission", dec("10")))
            .row(Row::new(0).with("order type", "other").with("commission", dec("2.5")))
            .row(Row::new(0).with("amount", dec("40")).with("commission", "n/a"))
            .build();
        let summary = aggregates(&table);
        assert_eq!(summary.commission(), dec("12.5"));
        assert_eq!(summary.amount(), dec("40"));
    }

    #[test]
    fn test_active_days() {
        let table = TableBuilder::new()
            .row(sale("d1", "regular", "1", "1", "5"))
            .row(sale("d1", "regular", "1", "1", "5"))
            .row(sale("d2", "regular", "1", "1", "0"))
            .row(sale("d3", "regular", "1", "1", "-2"))
            .row(Row::new(0).with("date", "d4").with("selling amount", dec("9")))
            .row(sale("", "regular", "1", "1", "3").with("date", Value::Empty))
            .row(sale("d5", "event", "1", "1", "1"))
            .build();
        assert_eq!(aggregates(&table).number_of_days(), 2);
    }

    #[test]
    fn test_metrics_order() {
        let names: Vec<_> = AggregateSummary::default()
            .metrics()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Number of Days",
                "Buying Amt AI (Regular)",
                "Selling Amt (Regular)",
                "Buying Amt AI (Event)",
                "Selling Amt (Event)",
                "Commission",
                "Amount",
            ]
        );
    }

    fn meal(site: &str, order_type: &str, rate: Value) -> Row {
        Row::new(0)
            .with("site name", site)
            .with("vendor", "fresh bites")
            .with("session", "lunch")
            .with("meal type", "veg")
            .with("order type", order_type)
            .with("rate", rate)
    }

    #[test]
    fn test_pivot_counts_and_averages_per_group() {
        let table = TableBuilder::new()
            .row(meal("whitefield", "regular", Value::number(100)))
            .row(meal("whitefield", "regular", Value::number(110)))
            .row(meal("whitefield", "regular", Value::Empty))
            .row(meal("koramangala", "event", Value::number(250)))
            .build();
        let pivot = pivot(&table);
        assert_eq!(pivot.len(), 2);

        assert_eq!(
            pivot[0].key().values(),
            ["koramangala", "fresh bites", "lunch", "veg", "event"]
        );
        assert_eq!(pivot[0].days(), 1);
        assert_eq!(pivot[0].average_selling_price(), Some(dec("250")));

        assert_eq!(pivot[1].key().values()[0], "whitefield");
        assert_eq!(pivot[1].days(), 3);
        assert_eq!(pivot[1].average_selling_price(), Some(dec("105")));
    }

    #[test]
    fn test_pivot_group_without_numeric_rate_has_no_average() {
        let table = TableBuilder::new()
            .row(meal("whitefield", "regular", Value::text("tbd")))
            .build();
        let pivot = pivot(&table);
        assert_eq!(pivot[0].days(), 1);
        assert_eq!(pivot[0].average_selling_price(), None);
    }

    #[test]
    fn test_pivot_skips_rows_with_blank_key() {
        let table = TableBuilder::new()
            .row(meal("whitefield", "regular", Value::number(100)).with("vendor", Value::Empty))
            .row(Row::new(0).with("rate", dec("5")))
            .build();
        assert!(pivot(&table).is_empty());
    }

    #[test]
    fn test_overflowing_row_is_left_out_of_the_summary() {
        let table = TableBuilder::new()
            .row(sale("d1", "regular", "1", "10", "1").with("commission", dec("2")))
            .row(
                sale("d2", "regular", "1", "10", "1")
                    .with("selling amount", Decimal::MAX)
                    .with("commission", dec("3")),
            )
            .row(sale("d3", "event", "5", "20", "1"))
            .build();
        let mut diagnostics = Diagnostics::new();
        let summary = calculate_aggregates(&table, &RunOptions::default(), &mut diagnostics);

        // row 4 would push the regular selling amount past the largest decimal
        let regular = summary.bucket(OrderBucket::Regular);
        assert_eq!(regular.buying_amt_ai(), dec("1"));
        assert_eq!(regular.selling_amount(), dec("10"));
        assert_eq!(summary.bucket(OrderBucket::Event).selling_amount(), dec("20"));
        assert_eq!(summary.commission(), dec("2"));
        assert_eq!(summary.number_of_days(), 2);

        let errors: Vec<_> = diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row(), Some(4));
        assert_eq!(
            errors[0].message(),
            "Error processing row 4: the 'selling amount' total is too large to compute"
        );
    }

    #[test]
    fn test_total_overflow_is_none() {
        let table = TableBuilder::new()
            .row(sale("d1", "regular", "1", "1", "1").with("selling amount", Decimal::MAX))
            .row(sale("d1", "event", "1", "1", "1").with("selling amount", Decimal::MAX))
            .build();
        let summary = aggregates(&table);
        assert_eq!(summary.bucket(OrderBucket::Event).selling_amount(), Decimal::MAX);
        assert_eq!(summary.total(), None);
    }

    #[test]
    fn test_pivot_rate_overflow_has_no_average() {
        let table = TableBuilder::new()
            .row(meal("whitefield", "regular", Value::number(Decimal::MAX)))
            .row(meal("whitefield", "regular", Value::number(Decimal::MAX)))
            .row(meal("whitefield", "event", Value::number(100)))
            .build();
        let mut diagnostics = Diagnostics::new();
        let pivot = pivot_average_prices(&table, &RunOptions::default(), &mut diagnostics);
        assert_eq!(pivot.len(), 2);
        assert_eq!(pivot[0].average_selling_price(), Some(dec("100")));
        assert_eq!(pivot[1].days(), 2);
        assert_eq!(pivot[1].average_selling_price(), None);
        let errors: Vec<_> = diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row(), Some(4));
    }
}
