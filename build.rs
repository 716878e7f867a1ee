fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Migrations are embedded with sqlx::migrate!
    println!("cargo:rerun-if-changed=migrations");
    // Rebuild if i18n files change
    println!("cargo:rerun-if-changed=i18n");

    // Emit version information (if not provided by the packaging environment)
    let mut vergen = vergen::EmitBuilder::builder();
    println!("cargo:rerun-if-env-changed=VERGEN_GIT_COMMIT_DATE");
    if std::env::var_os("VERGEN_GIT_COMMIT_DATE").is_none() {
        vergen.git_commit_date();
    }
    println!("cargo:rerun-if-env-changed=VERGEN_GIT_SHA");
    if std::env::var_os("VERGEN_GIT_SHA").is_none() {
        vergen.git_sha(false);
    }
    // NOTE: source tarballs have no git metadata, vergen falls back to placeholder values.
    vergen.emit()?;
    Ok(())
}
