#[salsa::input(debug)]
pub struct File {
    #[returns(ref)]
    pub path: camino::Utf8PathBuf,
    #[returns(deref)]
    pub text: String,
    /// Source starts directly in PHP code, without an open tag.
    pub php: bool,
}

#[salsa::tracked]
impl File {
    /// Number of source lines, counting a trailing empty line.
    #[salsa::tracked]
    pub fn line_count(self, db: &dyn salsa::Database) -> usize {
        self.text(db).matches('\n').count() + 1
    }
}
