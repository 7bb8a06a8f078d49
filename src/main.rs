fn main() -> anyhow::Result<()> {
    let command_line_interface = scalar_forge::cli::CommandLineInterface::load();
    command_line_interface.run()
}
