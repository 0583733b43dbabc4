// This crate exposes three binaries: `storage_node`, `router`, `kv_client`.
//
//   cargo run --bin storage_node -- --config node.yaml
//   cargo run --bin router -- --config router.yaml
//   cargo run --bin kv_client -- --config client.yaml

fn main() {
    eprintln!("pick a binary: storage_node, router, or kv_client");
    std::process::exit(1);
}
