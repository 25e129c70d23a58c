use core::panic::PanicInfo;

use crate::hal::riscv::halt;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("\n[kernel] PANIC!");
    if let Some(location) = info.location() {
        println!(
            "[kernel] panicked at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    println!("[kernel] Message: {}", info.message());
    halt()
}

// 预编译的 liballoc 引用此符号；panic = "abort" 下永远不会被调用，
// 只为满足链接器
#[no_mangle]
extern "C" fn rust_eh_personality() {}
