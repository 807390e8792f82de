use cfg_aliases::cfg_aliases;

fn main() {
    // The script doesn't depend on our code
    println!("cargo:rerun-if-changed=build.rs");
    // But it *does* depend on cfgs!
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");
    println!("cargo:rerun-if-env-changed=RUSTDOCFLAGS");

    // Short names for the protocol revisions. Unlike client platforms, these are available
    // everywhere a compositor can run, so the feature alone decides.
    cfg_aliases! {
        // Early experimental `wl_tablet`, definitions carried in-crate.
        legacy_tablet: { feature = "tablet-legacy" },
        // `tablet_unstable_v1`, definitions from `wayland-protocols`.
        unstable_tablet: { feature = "tablet-unstable-v1" },
    }
}
