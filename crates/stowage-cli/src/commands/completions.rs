use clap_complete::Shell;

/// Print the completion script for `shell` to stdout.
pub fn completions(shell: Shell, cmd: &mut clap::Command) {
    let name = cmd.get_name().to_owned();
    clap_complete::generate(shell, cmd, name, &mut std::io::stdout());
}
