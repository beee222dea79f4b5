use super::partial_update::{sql_for_partial_update, FieldSet, PartialUpdate, PartialUpdateError, SqlValue};

/// Tables the service writes to. The only source of identifiers that reach
/// [`sql_for_partial_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Companies,
    Jobs,
    Users,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Companies => "companies",
            Table::Jobs => "jobs",
            Table::Users => "users",
        }
    }

    pub fn primary_key(self) -> &'static str {
        match self {
            Table::Companies => "handle",
            Table::Jobs => "id",
            Table::Users => "username",
        }
    }

    /// Columns a PATCH may touch. Keys and server-managed columns are absent.
    pub fn updatable_columns(self) -> &'static [&'static str] {
        match self {
            Table::Companies => &["name", "num_employees", "description", "logo_url"],
            Table::Jobs => &["title", "salary", "equity", "company_handle"],
            Table::Users => &["password", "first_name", "last_name", "email", "photo_url"],
        }
    }

    /// Checks every column against the allow-list, then builds the statement.
    pub fn partial_update(
        self,
        fields: &FieldSet,
        pk_value: impl Into<SqlValue>,
    ) -> Result<PartialUpdate, PartialUpdateError> {
        let allowed = self.updatable_columns();
        if let Some(column) = fields
            .columns()
            .find(|c| !allowed.iter().any(|a| a == c))
        {
            return Err(PartialUpdateError::InvalidArgument(format!(
                "column '{}' cannot be updated on {}",
                column,
                self.name()
            )));
        }
        sql_for_partial_update(self.name(), fields, self.primary_key(), pk_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_update_uses_handle() {
        let fields = FieldSet::new().with("num_employees", 1000);
        let update = Table::Companies.partial_update(&fields, "acme").unwrap();
        assert_eq!(
            update.query,
            "UPDATE companies SET num_employees=$1 WHERE handle=$2 RETURNING *"
        );
        assert_eq!(
            update.values,
            vec![SqlValue::Int(1000), SqlValue::Text("acme".to_string())]
        );
    }

    #[test]
    fn test_job_update_uses_id() {
        let fields = FieldSet::new().with("title", "Chef").with("equity", 0.25);
        let update = Table::Jobs.partial_update(&fields, 3).unwrap();
        assert_eq!(
            update.query,
            "UPDATE jobs SET title=$1, equity=$2 WHERE id=$3 RETURNING *"
        );
    }

    #[test]
    fn test_rejects_column_outside_allow_list() {
        let fields = FieldSet::new().with("is_admin", true);
        let err = Table::Users.partial_update(&fields, "jk").unwrap_err();
        assert_eq!(
            err,
            PartialUpdateError::InvalidArgument(
                "column 'is_admin' cannot be updated on users".to_string()
            )
        );
    }

    #[test]
    fn test_primary_key_not_updatable() {
        for table in [Table::Companies, Table::Jobs, Table::Users] {
            assert!(!table.updatable_columns().contains(&table.primary_key()));
        }
    }

    #[test]
    fn test_empty_fields_still_rejected() {
        assert!(Table::Jobs.partial_update(&FieldSet::new(), 1).is_err());
    }
}
