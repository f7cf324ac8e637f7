use bizscope_core::{ListParams, ListResult};
use bizscope_sql::{Order, Row, Select};

use crate::model::{Action, Principal, ResourcePolicy};
use crate::service::{AccessError, AccessService};

impl AccessService {
    /// List rows of a business table, restricted to what `principal` may see.
    ///
    /// `total` counts every visible row, ignoring pagination. A `Forbidden`
    /// scope fails before any query runs.
    pub fn list_scoped(
        &self,
        principal: &Principal,
        resource: &ResourcePolicy,
        table: &str,
        params: &ListParams,
    ) -> Result<ListResult<Row>, AccessError> {
        let filter = self.scope_filter(principal, resource, Action::View)?;

        let mut select = Select::new(table).filter(filter.predicate());
        let total = self.sql.count(&select)?;

        if let Some((column, desc)) = params.sort_column() {
            let order = if desc { Order::Desc } else { Order::Asc };
            select = select.order_by(column, order);
        }
        let select = select
            .limit(params.effective_limit())
            .offset(params.offset);
        let items = self.sql.select(&select)?;

        Ok(ListResult { items, total })
    }
}
