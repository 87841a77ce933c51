//
// main.rs
//
// Command-line entry point of the luasense language server
//

use std::env;

use luasense::backend;

fn print_usage() {
    println!(
        "luasense {}, a heuristic Lua language server.",
        env!("CARGO_PKG_VERSION")
    );
    print!(
        r#"
Usage: luasense [OPTIONS]

Available options:

--stdio                      Start the LSP server using stdio transport
--version                    Print the version
--help                       Print this help message

Set RUST_LOG (e.g. RUST_LOG=luasense=trace) to control logging on stderr.

"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let mut use_stdio = false;

    for arg in argv {
        match arg.as_str() {
            "--stdio" => use_stdio = true,
            "--version" => {
                println!("luasense {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("Unknown argument: '{other}'"));
            }
        }
    }

    if !use_stdio {
        print_usage();
        return Ok(());
    }

    env_logger::init();

    backend::start_lsp().await
}
