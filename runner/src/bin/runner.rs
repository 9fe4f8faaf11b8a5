//! A bare `MultiServer` binary: starts the stock Agent and Zone binaries'
//! logic in one process for local development. Real deployments run
//! `pastry-agent`/`pastry-zone` as separate processes instead; embedding
//! games are expected to write their own small `main.rs` wiring their own
//! `ManagedServer` impls into `MultiServer`.

fn main() {
    eprintln!(
        "pastry-runner has no standalone servers of its own to run -- \
         embed `runner::MultiServer` in your own binary and register your \
         Agent/Zone `ManagedServer` adapters with it."
    );
    std::process::exit(1);
}
