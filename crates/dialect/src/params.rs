/// Ingredients for `SqlDialect::render_merge_statement`: the load layer
/// supplies the semantic shape, the dialect owns the SQL.
pub struct MergeParams<'a> {
    pub target_fqn: &'a str,
    pub source_select_sql: &'a str,
    pub key_columns: &'a [String],
    pub update_columns: &'a [String],
    pub insert_columns: &'a [String],
    pub target_alias: &'a str,
    pub source_alias: &'a str,
}

/// Ingredients for a single `INSERT ... SELECT ... WHERE (NOT) EXISTS` leg of
/// the SCD2 hist pipeline.
pub struct HistInsertParams<'a> {
    pub hist_schema: &'a str,
    pub hist_table: &'a str,
    pub hist_columns_sql: &'a [String],
    pub source_schema: &'a str,
    pub source_table: &'a str,
    pub source_alias: &'a str,
    pub select_exprs_sql: &'a [String],
    pub exists_schema: &'a str,
    pub exists_table: &'a str,
    pub exists_alias: &'a str,
    pub exists_predicates: &'a [String],
    pub exists_negated: bool,
}

/// Ingredients for the full four-statement SCD2 incremental pipeline.
pub struct HistIncrementalParams<'a> {
    pub schema_name: &'a str,
    pub hist_table: &'a str,
    pub rawcore_table: &'a str,
    pub include_comment: bool,
    pub include_inserts: bool,
    pub changed_insert: Option<HistInsertParams<'a>>,
    pub new_insert: Option<HistInsertParams<'a>>,
}
