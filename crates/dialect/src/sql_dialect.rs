use elevata_expr::{
    Expr, FromSource, Join, Literal, LogicalSelect, LogicalUnion, OrderDirection, PlanNode,
    RawSql, SourceTable, SubquerySource, UnionType,
};
use elevata_types::{CanonicalType, PhysicalType, TypeParams};

use crate::column::{ColumnDef, RebuildColumn};
use crate::error::DialectError;
use crate::params::{HistIncrementalParams, HistInsertParams, MergeParams};

/// Translates vendor-neutral `Expr`/`LogicalSelect`/`PlanNode` trees and DDL
/// intents into concrete SQL text for one engine.
///
/// Every method has a reasonable ANSI-ish default; dialects override only
/// where their SQL actually diverges (identifiers, physical types, hashing,
/// concatenation, merge/rename mechanics).
pub trait SqlDialect {
    fn name(&self) -> &'static str;

    // -----------------------------------------------------------------
    // Capabilities
    // -----------------------------------------------------------------
    fn supports_merge(&self) -> bool {
        false
    }

    fn supports_alter_column_type(&self) -> bool {
        false
    }

    fn supports_delete_detection(&self) -> bool {
        true
    }

    // -----------------------------------------------------------------
    // Identifiers
    // -----------------------------------------------------------------
    fn quote_ident(&self, name: &str) -> String;

    fn should_quote(&self, name: &str) -> bool {
        if name.is_empty() {
            return true;
        }
        if name.chars().next().unwrap().is_ascii_digit() {
            return true;
        }
        !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn render_identifier(&self, name: &str) -> String {
        if self.should_quote(name) {
            self.quote_ident(name)
        } else {
            name.to_string()
        }
    }

    fn render_table_identifier(&self, schema: Option<&str>, name: &str) -> String {
        let name_sql = self.render_identifier(name);
        match schema {
            Some(s) => format!("{}.{}", self.render_identifier(s), name_sql),
            None => name_sql,
        }
    }

    // -----------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------
    fn render_physical_type(&self, physical: &PhysicalType, strict: bool) -> Result<String, DialectError>;

    // -----------------------------------------------------------------
    // DDL
    // -----------------------------------------------------------------
    fn render_create_schema_if_not_exists(&self, schema: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {}", self.render_identifier(schema))
    }

    fn render_create_table_if_not_exists_from_columns(
        &self,
        schema: &str,
        table: &str,
        columns: &[ColumnDef],
    ) -> String {
        let target = self.render_table_identifier(Some(schema), table);
        let cols_sql = self.render_column_defs(columns);
        format!("CREATE TABLE IF NOT EXISTS {target} (\n  {cols_sql}\n)")
    }

    fn render_create_table_from_columns(&self, schema: &str, table: &str, columns: &[ColumnDef]) -> String {
        let target = self.render_table_identifier(Some(schema), table);
        let cols_sql = self.render_column_defs(columns);
        format!("CREATE TABLE {target} (\n  {cols_sql}\n)")
    }

    fn render_column_defs(&self, columns: &[ColumnDef]) -> String {
        columns
            .iter()
            .map(|c| {
                let name = self.render_identifier(&c.name);
                let null_sql = if c.nullable { "NULL" } else { "NOT NULL" };
                format!("{name} {} {null_sql}", c.physical_type)
            })
            .collect::<Vec<_>>()
            .join(",\n  ")
    }

    fn render_add_column(&self, schema: &str, table: &str, column: &str, column_type: &str) -> String {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        format!("ALTER TABLE {tbl} ADD COLUMN {col} {column_type}")
    }

    /// `None` means the dialect cannot alter the column's type in place; the
    /// caller must fall back to a rebuild sequence.
    fn render_alter_column_type(&self, _schema: &str, _table: &str, _column: &str, _new_type: &str) -> Option<String> {
        None
    }

    fn render_drop_table(&self, schema: &str, table: &str) -> String {
        format!("DROP TABLE {}", self.render_table_identifier(Some(schema), table))
    }

    fn render_drop_table_if_exists(&self, schema: &str, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.render_table_identifier(Some(schema), table))
    }

    fn render_truncate_table(&self, schema: &str, table: &str) -> String {
        format!("DELETE FROM {};", self.render_table_identifier(Some(schema), table))
    }

    fn render_rename_table(&self, schema: &str, old_table: &str, new_table: &str) -> String {
        let old_full = self.render_table_identifier(Some(schema), old_table);
        let new_name = self.render_identifier(new_table);
        format!("ALTER TABLE {old_full} RENAME TO {new_name}")
    }

    fn render_rename_column(&self, schema: &str, table: &str, old: &str, new: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.render_table_identifier(Some(schema), table),
            self.render_identifier(old),
            self.render_identifier(new)
        )
    }

    fn render_insert_select_for_rebuild(
        &self,
        schema: &str,
        src_table: &str,
        dst_table: &str,
        columns: &[RebuildColumn],
        lossy_casts: bool,
        truncate_strings: bool,
    ) -> String {
        let src = self.render_table_identifier(Some(schema), src_table);
        let dst = self.render_table_identifier(Some(schema), dst_table);

        let mut col_names = Vec::with_capacity(columns.len());
        let mut select_exprs = Vec::with_capacity(columns.len());
        for c in columns {
            let col = self.render_identifier(&c.name);
            let src_col = self.render_identifier(c.source_column_name());
            let mut expr = if lossy_casts {
                self.cast_expression(&src_col, &c.physical_type)
            } else {
                src_col.clone()
            };
            if truncate_strings {
                if let Some(len) = c.truncate_to_length {
                    let ty_upper = c.physical_type.to_ascii_uppercase();
                    let is_stringish = ["CHAR", "STRING", "TEXT", "VARCHAR"].iter().any(|t| ty_upper.contains(t));
                    if is_stringish {
                        expr = self.truncate_string_expression(&expr, len);
                    }
                }
            }
            col_names.push(col.clone());
            select_exprs.push(format!("{expr} AS {col}"));
        }

        format!(
            "INSERT INTO {dst} ({}) SELECT {} FROM {src};",
            col_names.join(", "),
            select_exprs.join(", ")
        )
    }

    fn render_create_or_replace_view(&self, schema: &str, view: &str, select_sql: &str) -> String {
        format!(
            "CREATE OR REPLACE VIEW {} AS\n{select_sql}",
            self.render_table_identifier(Some(schema), view)
        )
    }

    fn render_insert_into_table(
        &self,
        schema: &str,
        table: &str,
        select_sql: &str,
        target_columns: Option<&[String]>,
    ) -> String {
        let tbl = self.render_table_identifier(Some(schema), table);
        match target_columns {
            Some(cols) if !cols.is_empty() => {
                let cols_sql = cols.iter().map(|c| self.render_identifier(c)).collect::<Vec<_>>().join(", ");
                format!("INSERT INTO {tbl} ({cols_sql})\n{select_sql}")
            }
            _ => format!("INSERT INTO {tbl}\n{select_sql}"),
        }
    }

    // -----------------------------------------------------------------
    // Historization (SCD Type 2)
    // -----------------------------------------------------------------
    fn render_hist_changed_update_sql(&self, schema_name: &str, hist_table: &str, rawcore_table: &str) -> String {
        let hist_tbl = self.render_table_identifier(Some(schema_name), hist_table);
        let rc_tbl = self.render_table_identifier(Some(schema_name), rawcore_table);
        let sk_name = self.render_identifier(&format!("{rawcore_table}_key"));
        let row_hash = self.render_identifier("row_hash");
        format!(
            "UPDATE {hist_tbl} AS h\nSET\n  version_ended_at = {{{{ load_timestamp }}}},\n  version_state    = 'changed',\n  load_run_id      = {{{{ load_run_id }}}}\nWHERE h.version_ended_at IS NULL\n  AND EXISTS (\n    SELECT 1\n    FROM {rc_tbl} AS r\n    WHERE r.{sk_name} = h.{sk_name}\n      AND r.{row_hash} <> h.{row_hash}\n  );"
        )
    }

    fn render_hist_delete_sql(&self, schema_name: &str, hist_table: &str, rawcore_table: &str) -> String {
        let hist_tbl = self.render_table_identifier(Some(schema_name), hist_table);
        let rc_tbl = self.render_table_identifier(Some(schema_name), rawcore_table);
        let sk_name = self.render_identifier(&format!("{rawcore_table}_key"));
        format!(
            "UPDATE {hist_tbl} AS h\nSET\n  version_ended_at = {{{{ load_timestamp }}}},\n  version_state    = 'deleted',\n  load_run_id      = {{{{ load_run_id }}}}\nWHERE h.version_ended_at IS NULL\n  AND NOT EXISTS (\n    SELECT 1\n    FROM {rc_tbl} AS r\n    WHERE r.{sk_name} = h.{sk_name}\n  );"
        )
    }

    fn render_hist_insert_statement(&self, p: &HistInsertParams<'_>) -> String {
        let hist_fqn = self.render_table_identifier(Some(p.hist_schema), p.hist_table);
        let src_fqn = self.render_table_identifier(Some(p.source_schema), p.source_table);
        let ex_fqn = self.render_table_identifier(Some(p.exists_schema), p.exists_table);

        let exists_kw = if p.exists_negated { "NOT EXISTS" } else { "EXISTS" };
        let preds: Vec<&String> = p.exists_predicates.iter().filter(|s| !s.trim().is_empty()).collect();
        let pred_sql = if preds.is_empty() {
            "1=1".to_string()
        } else {
            preds.iter().map(|s| s.as_str()).collect::<Vec<_>>().join("\n    AND ")
        };

        let cols_sql = p.hist_columns_sql.join(",\n  ");
        let exprs_sql = p.select_exprs_sql.join(",\n  ");

        format!(
            "INSERT INTO {hist_fqn} (\n  {cols_sql}\n)\nSELECT\n  {exprs_sql}\nFROM {src_fqn} AS {}\nWHERE {exists_kw} (\n  SELECT 1\n  FROM {ex_fqn} AS {}\n  WHERE {pred_sql}\n);",
            p.source_alias, p.exists_alias
        )
    }

    fn render_hist_incremental_statement(&self, p: &HistIncrementalParams<'_>) -> String {
        let mut parts: Vec<String> = Vec::new();
        if p.include_comment {
            parts.push(format!(
                "-- History load for {}.{} (SCD Type 2).\n-- Real SQL for new, changed and deleted business keys follows below.\n",
                p.schema_name, p.hist_table
            ));
        }
        parts.push(self.render_hist_changed_update_sql(p.schema_name, p.hist_table, p.rawcore_table));
        parts.push(String::new());
        parts.push(self.render_hist_delete_sql(p.schema_name, p.hist_table, p.rawcore_table));

        if p.include_inserts {
            if let Some(changed) = &p.changed_insert {
                parts.push(String::new());
                parts.push(self.render_hist_insert_statement(changed));
            }
            if let Some(new) = &p.new_insert {
                parts.push(String::new());
                parts.push(self.render_hist_insert_statement(new));
            }
        }

        let mut sql = parts.join("\n");
        while sql.ends_with('\n') || sql.ends_with(' ') {
            sql.pop();
        }
        sql.push('\n');
        sql
    }

    // -----------------------------------------------------------------
    // Merge / delete detection
    // -----------------------------------------------------------------
    fn render_merge_statement(&self, p: &MergeParams<'_>) -> Result<String, DialectError> {
        let keys: Vec<&String> = p.key_columns.iter().filter(|c| !c.is_empty()).collect();
        if keys.is_empty() {
            return Err(DialectError::MissingKeyColumns { op: "render_merge_statement" });
        }

        let mut insert_cols: Vec<String> = p.insert_columns.iter().filter(|c| !c.is_empty()).cloned().collect();
        if insert_cols.is_empty() {
            let mut seen = std::collections::HashSet::new();
            for c in keys.iter().map(|s| s.as_str()).chain(p.update_columns.iter().map(|s| s.as_str())) {
                if seen.insert(c) {
                    insert_cols.push(c.to_string());
                }
            }
        }

        let key_set: std::collections::HashSet<&str> = keys.iter().map(|s| s.as_str()).collect();
        let updates: Vec<&String> = p.update_columns.iter().filter(|c| !c.is_empty() && !key_set.contains(c.as_str())).collect();

        let q = |s: &str| self.render_identifier(s);
        let tgt = p.target_fqn.trim();
        let src = format!("(\n{}\n) AS {}", p.source_select_sql.trim(), q(p.source_alias));
        let on_pred = keys
            .iter()
            .map(|k| format!("{}.{} = {}.{}", q(p.target_alias), q(k), q(p.source_alias), q(k)))
            .collect::<Vec<_>>()
            .join(" AND ");

        if self.supports_merge() {
            let mut stmt = format!("MERGE INTO {tgt} AS {}\nUSING {src}\nON {on_pred}", q(p.target_alias));
            if !updates.is_empty() {
                let assignments = updates
                    .iter()
                    .map(|c| format!("{} = {}.{}", q(c), q(p.source_alias), q(c)))
                    .collect::<Vec<_>>()
                    .join(", ");
                stmt.push_str(&format!("\nWHEN MATCHED THEN UPDATE SET {assignments}"));
            }
            let insert_cols_sql = insert_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
            let insert_vals_sql = insert_cols.iter().map(|c| format!("{}.{}", q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
            stmt.push_str(&format!("\nWHEN NOT MATCHED THEN INSERT ({insert_cols_sql}) VALUES ({insert_vals_sql});"));
            return Ok(stmt);
        }

        let mut update_sql = String::new();
        if !updates.is_empty() {
            let set_sql = updates
                .iter()
                .map(|c| format!("{}.{} = {}.{}", q(p.target_alias), q(c), q(p.source_alias), q(c)))
                .collect::<Vec<_>>()
                .join(", ");
            update_sql = format!("UPDATE {tgt} AS {}\nSET {set_sql}\nFROM {src}\nWHERE {on_pred};", q(p.target_alias));
        }

        let insert_cols_sql = insert_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let select_cols_sql = insert_cols.iter().map(|c| format!("{}.{}", q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
        let insert_sql = format!(
            "INSERT INTO {tgt} ({insert_cols_sql})\nSELECT {select_cols_sql}\nFROM {src}\nWHERE NOT EXISTS (\n  SELECT 1\n  FROM {tgt} AS {}\n  WHERE {on_pred}\n);",
            q(p.target_alias)
        );

        if update_sql.is_empty() {
            Ok(insert_sql)
        } else {
            Ok(format!("{update_sql}\n\n{insert_sql}"))
        }
    }

    fn render_delete_detection_statement(
        &self,
        target_schema: &str,
        target_table: &str,
        stage_schema: &str,
        stage_table: &str,
        join_predicates: &[String],
        scope_filter: Option<&str>,
    ) -> String {
        let target = self.render_table_identifier(Some(target_schema), target_table);
        let stage = self.render_table_identifier(Some(stage_schema), stage_table);
        let join_sql = if join_predicates.is_empty() { "1=1".to_string() } else { join_predicates.join(" AND ") };

        let mut conditions = Vec::new();
        if let Some(scope) = scope_filter {
            conditions.push(format!("({scope})"));
        }
        conditions.push(format!("NOT EXISTS (\n  SELECT 1\n  FROM {stage} AS s\n  WHERE {join_sql}\n)"));

        let where_sql = conditions.join("\n  AND ");
        format!("DELETE FROM {target} AS t\nWHERE {where_sql};")
    }

    fn param_placeholder(&self) -> &'static str {
        "?"
    }

    // -----------------------------------------------------------------
    // Expression / SELECT rendering
    // -----------------------------------------------------------------
    fn render_literal(&self, lit: &Literal) -> String {
        match lit {
            Literal::Null => "NULL".to_string(),
            Literal::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    fn cast_expression(&self, expr: &str, target_type: &str) -> String {
        format!("CAST({expr} AS {target_type})")
    }

    fn truncate_string_expression(&self, expr: &str, max_length: i32) -> String {
        format!("LEFT({expr}, {max_length})")
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        rendered_parts.join(" || ")
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError>;

    fn render_string_agg(&self, args: &[Expr]) -> Result<String, DialectError> {
        if args.len() < 2 {
            return Err(DialectError::StringAggArity);
        }
        let value_sql = self.render_expr(&args[0])?;
        let delim_sql = self.render_expr(&args[1])?;
        if args.len() >= 3 {
            return Err(DialectError::StringAggOrderByUnsupported(self.name()));
        }
        Ok(format!("STRING_AGG({value_sql}, {delim_sql})"))
    }

    fn render_expr(&self, expr: &Expr) -> Result<String, DialectError> {
        render_expr_default(self, expr)
    }

    fn render_raw_sql(&self, raw: &RawSql) -> Result<String, DialectError> {
        let mut sql = raw.sql.clone();
        if let Some(alias) = &raw.default_table_alias {
            sql = sql.replace("{alias}", alias);
        }
        if raw.is_template && !raw.expr_bindings.is_empty() {
            sql = substitute_expr_bindings(self, &sql, raw)?;
        }
        Ok(sql)
    }

    fn render_select(&self, select: &LogicalSelect) -> Result<String, DialectError> {
        let mut items_sql = Vec::with_capacity(select.select_list.len());
        for item in &select.select_list {
            let expr_sql = self.render_expr(&item.expr)?;
            match &item.alias {
                Some(alias) => items_sql.push(format!("{expr_sql} AS {}", self.render_identifier(alias))),
                None => items_sql.push(expr_sql),
            }
        }
        let select_list = if items_sql.is_empty() { "*".to_string() } else { items_sql.join(",\n  ") };

        let mut lines = Vec::new();
        lines.push(if select.distinct { "SELECT DISTINCT".to_string() } else { "SELECT".to_string() });
        lines.push(format!("  {select_list}"));
        lines.push("FROM".to_string());
        lines.push(format!("  {}", self.render_from_item(&select.from)?));

        for join in &select.joins {
            lines.push(self.render_join(join)?);
        }

        if let Some(where_) = &select.where_ {
            lines.push("WHERE".to_string());
            lines.push(format!("  {}", self.render_expr(where_)?));
        }

        if !select.group_by.is_empty() {
            let gb = select.group_by.iter().map(|e| self.render_expr(e)).collect::<Result<Vec<_>, _>>()?.join(", ");
            lines.push(format!("GROUP BY {gb}"));
        }

        if !select.order_by.is_empty() {
            let ob = select.order_by.iter().map(|e| self.render_expr(e)).collect::<Result<Vec<_>, _>>()?.join(", ");
            lines.push(format!("ORDER BY {ob}"));
        }

        Ok(lines.join("\n"))
    }

    fn render_plan(&self, plan: &PlanNode) -> Result<String, DialectError> {
        match plan {
            PlanNode::Select(select) => self.render_select(select),
            PlanNode::Union(union) => self.render_union(union),
        }
    }

    fn render_union(&self, union: &LogicalUnion) -> Result<String, DialectError> {
        let sep = match union.union_type {
            UnionType::All => "\nUNION ALL\n",
            UnionType::Union => "\nUNION\n",
        };
        let rendered = union.selects.iter().map(|p| self.render_plan(p)).collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(sep))
    }

    fn render_from_item(&self, item: &FromSource) -> Result<String, DialectError> {
        match item {
            FromSource::Table(SourceTable { schema, name, alias }) => {
                let tbl = self.render_table_identifier(schema.as_deref(), name);
                Ok(format!("{tbl} AS {}", self.render_identifier(alias)))
            }
            FromSource::Subquery(SubquerySource { select, alias }) => {
                let inner = self.render_plan(select)?;
                Ok(format!("(\n{inner}\n) AS {}", self.render_identifier(alias)))
            }
        }
    }

    fn render_join(&self, join: &Join) -> Result<String, DialectError> {
        let jt = match join.join_type {
            elevata_expr::JoinType::Inner => "INNER",
            elevata_expr::JoinType::Left => "LEFT",
            elevata_expr::JoinType::Right => "RIGHT",
            elevata_expr::JoinType::Full => "FULL",
            elevata_expr::JoinType::Cross => "CROSS",
        };
        let right = self.render_from_item(&join.right)?;
        match &join.on {
            Some(on) => Ok(format!("{jt} JOIN {right} ON {}", self.render_expr(on)?)),
            None => Ok(format!("{jt} JOIN {right}")),
        }
    }
}

/// Shared default body for `SqlDialect::render_expr`, extracted into a free function
/// so dialect overrides (e.g. BigQuery's `CONCAT_WS` interception) can fall back to it.
pub(crate) fn render_expr_default<D: SqlDialect + ?Sized>(dialect: &D, expr: &Expr) -> Result<String, DialectError> {
    match expr {
        Expr::Literal(lit) => Ok(dialect.render_literal(lit)),
        Expr::ColumnRef { table_alias, column_name } => match table_alias {
            Some(alias) => Ok(format!("{}.{}", dialect.render_identifier(alias), dialect.render_identifier(column_name))),
            None => Ok(dialect.render_identifier(column_name)),
        },
        Expr::RawSql(raw) => dialect.render_raw_sql(raw),
        Expr::Cast { expr, target_type } => {
            let inner = dialect.render_expr(expr)?;
            match parse_canonical_type_token(target_type) {
                Some(canonical) => {
                    let physical = dialect.render_physical_type(&PhysicalType::simple(canonical), false)?;
                    Ok(dialect.cast_expression(&inner, &physical))
                }
                None => Ok(inner),
            }
        }
        Expr::Coalesce(parts) => {
            let rendered = parts.iter().map(|p| dialect.render_expr(p)).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("COALESCE({})", rendered.join(", ")))
        }
        Expr::Concat(parts) => {
            let rendered = parts.iter().map(|p| dialect.render_expr(p)).collect::<Result<Vec<_>, _>>()?;
            Ok(dialect.concat_expression(&rendered))
        }
        Expr::FuncCall { name, args } => {
            let fn_lc = name.to_ascii_lowercase();
            if (fn_lc == "hash256" || fn_lc == "sha256") && args.len() == 1 {
                let inner = dialect.render_expr(&args[0])?;
                return dialect.hash_expression(&inner);
            }
            if name == "COUNT_DISTINCT" {
                if args.len() != 1 {
                    return Err(DialectError::MissingKeyColumns { op: "COUNT_DISTINCT" });
                }
                let inner = dialect.render_expr(&args[0])?;
                return Ok(format!("COUNT(DISTINCT {inner})"));
            }
            if name == "STRING_AGG" {
                return dialect.render_string_agg(args);
            }
            let args_sql = args.iter().map(|a| dialect.render_expr(a)).collect::<Result<Vec<_>, _>>()?.join(", ");
            Ok(format!("{name}({args_sql})"))
        }
        Expr::Window(win) => {
            let func_name = win.name.to_ascii_uppercase();
            let args_sql = win.args.iter().map(|a| dialect.render_expr(a)).collect::<Result<Vec<_>, _>>()?.join(", ");
            let mut parts = Vec::new();
            if !win.window.partition_by.is_empty() {
                let part_sql = win.window.partition_by.iter().map(|e| dialect.render_expr(e)).collect::<Result<Vec<_>, _>>()?.join(", ");
                parts.push(format!("PARTITION BY {part_sql}"));
            }
            if !win.window.order_by.is_empty() {
                let order_sql = win
                    .window
                    .order_by
                    .iter()
                    .map(|o| {
                        let inner = dialect.render_expr(&o.expr)?;
                        let dir = match o.direction {
                            OrderDirection::Asc => "ASC",
                            OrderDirection::Desc => "DESC",
                        };
                        Ok::<_, DialectError>(format!("{inner} {dir}"))
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .join(", ");
                parts.push(format!("ORDER BY {order_sql}"));
            }
            let over_sql = parts.join(" ");
            if over_sql.is_empty() {
                Ok(format!("{func_name}({args_sql}) OVER ()"))
            } else {
                Ok(format!("{func_name}({args_sql}) OVER ({over_sql})"))
            }
        }
    }
}

fn substitute_expr_bindings(dialect: &(impl SqlDialect + ?Sized), sql: &str, raw: &RawSql) -> Result<String, DialectError> {
    lazy_static::lazy_static! {
        static ref BINDING_RE: regex::Regex = regex::Regex::new(r"\{expr:([A-Za-z0-9_]+)\}").unwrap();
    }
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for caps in BINDING_RE.captures_iter(sql) {
        let m = caps.get(0).unwrap();
        let key = &caps[1];
        let bound = raw
            .expr_bindings
            .get(key)
            .ok_or_else(|| DialectError::MissingExprBinding(key.to_string()))?;
        out.push_str(&sql[last..m.start()]);
        out.push_str(&dialect.render_expr(bound)?);
        last = m.end();
    }
    out.push_str(&sql[last..]);
    Ok(out)
}

/// Parses a bare canonical type token (e.g. from `Cast { target_type }`) back
/// into a `CanonicalType`. Unrecognized spellings fall back to `None`, which
/// callers treat as "render the inner expression without a CAST".
pub fn parse_canonical_type_token(token: &str) -> Option<CanonicalType> {
    match token.trim().to_ascii_uppercase().as_str() {
        "STRING" | "TEXT" | "VARCHAR" | "CHAR" => Some(CanonicalType::String),
        "INTEGER" | "INT" => Some(CanonicalType::Integer),
        "BIGINT" => Some(CanonicalType::BigInt),
        "DECIMAL" | "NUMERIC" => Some(CanonicalType::Decimal),
        "FLOAT" | "DOUBLE" => Some(CanonicalType::Float),
        "BOOLEAN" | "BOOL" => Some(CanonicalType::Boolean),
        "DATE" => Some(CanonicalType::Date),
        "TIME" => Some(CanonicalType::Time),
        "TIMESTAMP" | "DATETIME" => Some(CanonicalType::Timestamp),
        "BINARY" | "BYTES" => Some(CanonicalType::Binary),
        "UUID" => Some(CanonicalType::Uuid),
        "JSON" => Some(CanonicalType::Json),
        _ => None,
    }
}

/// Renders a `PhysicalType` with no length/precision/scale, useful for
/// dialects whose `render_physical_type` ignores `TypeParams::NONE`.
pub fn simple_params() -> TypeParams {
    TypeParams::NONE
}
