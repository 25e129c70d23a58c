fn main() {
    println!("cargo:rerun-if-changed=src/linker.ld");
    let target = std::env::var("TARGET").unwrap_or_default();
    if target.starts_with("riscv64") {
        let manifest = std::env::var("CARGO_MANIFEST_DIR").unwrap();
        println!("cargo:rustc-link-arg=-T{}/src/linker.ld", manifest);
    } else {
        // 宿主机 no_std 可执行文件仍用 C 运行时启动（Scrt1.o 调
        // __libc_start_main），需要显式链接 libc
        println!("cargo:rustc-link-lib=c");
    }
}
