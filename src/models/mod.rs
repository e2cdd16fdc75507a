pub mod budget;
pub mod item;
pub mod pricing;

pub use budget::{Budget, BudgetDetail, BudgetLineItem, BudgetTotals, PromobFile};
pub use item::{ClassifiedItem, ItemCategory, RawItemRecord, UnknownCategory};
pub use pricing::{CompanySettings, HardwarePrice, MarginRule, PriceTable, SheetPrice};
