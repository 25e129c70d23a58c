//! 页粒度内存服务。
//!
//! 调度子系统只把它当作 allocate(页数)/free(地址) 协作者使用，
//! 背后是 `buddy_system_allocator` 管理的一块静态区域。
//! `init` 幂等：重复调用只有第一次生效，宿主机测试可以放心
//! 在任何入口先调一遍。

use core::alloc::Layout;
use core::fmt;
use core::ptr::{addr_of_mut, NonNull};

use buddy_system_allocator::LockedHeap;
use spin::Once;

use crate::hal::platform::{KERNEL_HEAP_SIZE, PAGE_SIZE, PAGE_SIZE_BITS};

// buddy_system_allocator 的 `extern crate alloc` 把 alloc 连进了
// no_std 可执行文件，链接器因此要求一个 #[global_allocator]；
// 内核自身不经由它分配（见 DESIGN.md），测试构建沿用 std 的分配器。
#[cfg_attr(not(test), global_allocator)]
static HEAP: LockedHeap<32> = LockedHeap::empty();

static mut HEAP_SPACE: [u8; KERNEL_HEAP_SIZE] = [0; KERNEL_HEAP_SIZE];

static HEAP_INIT: Once<()> = Once::new();

/// 页分配失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    pub pages: usize,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate {} pages", self.pages)
    }
}

pub fn init() {
    HEAP_INIT.call_once(|| unsafe {
        HEAP.lock()
            .init(addr_of_mut!(HEAP_SPACE) as usize, KERNEL_HEAP_SIZE);
    });
}

fn layout_for(pages: usize) -> Layout {
    // 页对齐、页整数倍；pages 合法性由调用方常量保证
    Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).unwrap()
}

/// 分配 `pages` 个连续页，返回起始地址
pub fn alloc_pages(pages: usize) -> Result<NonNull<u8>, AllocError> {
    if pages == 0 {
        return Err(AllocError { pages });
    }
    HEAP.lock()
        .alloc(layout_for(pages))
        .map_err(|_| AllocError { pages })
}

/// 归还此前分配的页区域
pub fn free_pages(ptr: NonNull<u8>, pages: usize) {
    HEAP.lock().dealloc(ptr, layout_for(pages));
}

/// 堆的总页数，启动时打给诊断日志用
pub fn heap_pages() -> usize {
    KERNEL_HEAP_SIZE >> PAGE_SIZE_BITS
}
