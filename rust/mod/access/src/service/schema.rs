use bizscope_sql::SQLStore;

use crate::service::AccessError;

/// Initialize the SQLite schema for the hierarchy and grant tables.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), AccessError> {
    let statements = [
        // Company membership; created_by is the member's manager in that company
        "CREATE TABLE IF NOT EXISTS company_users (
            user_id INTEGER NOT NULL,
            company_id INTEGER NOT NULL,
            created_by INTEGER,
            PRIMARY KEY (user_id, company_id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_company_users_creator ON company_users(company_id, created_by)",

        // Resolved permission keys; NULL company means every company
        "CREATE TABLE IF NOT EXISTS permission_grants (
            user_id INTEGER NOT NULL,
            company_id INTEGER,
            permission TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_permission_grants_user ON permission_grants(user_id, company_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}
