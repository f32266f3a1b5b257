// ABOUTME: Identifier quoting for generated SQL
// ABOUTME: Keeps table and column names safe to interpolate into queries

/// Quote a MySQL identifier with backticks
///
/// Embedded backticks are doubled, so any name the catalog returns can be
/// interpolated safely.
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_migrator::utils::quote_mysql_ident;
/// assert_eq!(quote_mysql_ident("users"), "`users`");
/// assert_eq!(quote_mysql_ident("we`ird"), "`we``ird`");
/// ```
pub fn quote_mysql_ident(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Quote a SQLite identifier with double quotes
///
/// # Examples
///
/// ```
/// # use mysql_sqlite_migrator::utils::quote_sqlite_ident;
/// assert_eq!(quote_sqlite_ident("order"), "\"order\"");
/// assert_eq!(quote_sqlite_ident("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_sqlite_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
