fn main() -> anyhow::Result<()> {
    draftbox::cli::run()
}
