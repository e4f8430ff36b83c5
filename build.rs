fn main() {
    println!("cargo:rerun-if-changed=native/varargs.c");

    // execl/execlp are C-variadic and cannot be defined in Rust; a small
    // stub normalises their argument lists into vectors and hands off to
    // the hook bodies in src/hooks.rs. Nothing on the Rust side references
    // the stub, so the whole archive must be kept or the linker drops the
    // two symbols from the shared object.
    cc::Build::new()
        .file("native/varargs.c")
        .link_lib_modifier("+whole-archive")
        .compile("constellation_varargs");
}
