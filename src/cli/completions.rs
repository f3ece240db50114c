use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    stagehand completions bash > ~/.bash_completion.d/stagehand\n\n\
                  Generate zsh completions:\n    stagehand completions zsh > ~/.zfunc/_stagehand\n\n\
                  Generate fish completions:\n    stagehand completions fish > ~/.config/fish/completions/stagehand.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
