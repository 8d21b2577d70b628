mod condition;
mod criteria;
mod page;
mod patterns;

pub use condition::{
    Condition, InCondition, RawStatement, ReduceCondition, ReduceKind, RefreshCondition, Row,
};
pub use criteria::{Criteria, Direction, Op, Pagination, Predicate, Sort};
pub use page::Page;
pub use patterns::{like_matches, pattern_matches};
