//! # 单处理器安全内部可变性封装模块
//!
//! ## Overview
//! 为内核全局状态提供 **单处理器（UP）环境** 下的内部可变性封装：
//! - `UPSafeCellRaw`：基于 `UnsafeCell` 的最底层封装，完全由使用者保证安全
//! - `UPIntrFreeCell`：访问期间自动屏蔽中断，防止陷入打断导致的数据竞争
//! - `UPIntrRefMut`：配合 `UPIntrFreeCell` 的 RAII 可变借用守卫
//!
//! ## Assumptions
//! - 单 hart，不存在真正的并行，只可能被中断打断
//! - 中断屏蔽提供足够的互斥保证——这在多核上不成立，
//!   本模块不得原样带进多核设计
//!
//! ## Invariants
//! - 某个 `UPIntrFreeCell` 处于可变借用状态时，中断必然被屏蔽
//! - `UPIntrRefMut` drop 时中断状态恢复到进入前的样子（支持嵌套）
//!
//! 注意与 `IntrLock` 的分工：`IntrLock` 是任务可见的临界区原语，
//! release 无条件开中断、不可嵌套；本模块是内核内部的保护手段，
//! 按进入前状态恢复、可以嵌套。

use core::cell::{RefCell, RefMut, UnsafeCell};
use core::ops::{Deref, DerefMut};

use crate::hal::{Machine, MachineImpl};

/// 基于 `UnsafeCell` 的最底层 UP 封装，不做任何检查
pub struct UPSafeCellRaw<T> {
    inner: UnsafeCell<T>,
}

unsafe impl<T> Sync for UPSafeCellRaw<T> {}

impl<T> UPSafeCellRaw<T> {
    /// # Safety
    /// 调用者保证仅在单 hart 环境下使用，且不产生别名可变引用
    pub const unsafe fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    #[allow(clippy::mut_from_ref)]
    pub fn get_mut(&self) -> &mut T {
        unsafe { &mut (*self.inner.get()) }
    }
}

/// 中断屏蔽的嵌套计数：最外层进入时记下当时的开关状态，
/// 最外层退出时恢复
pub struct IntrMaskingInfo {
    nested_level: usize,
    enable_before: bool,
}

static INTR_MASKING_INFO: UPSafeCellRaw<IntrMaskingInfo> = unsafe {
    UPSafeCellRaw::new(IntrMaskingInfo {
        nested_level: 0,
        enable_before: false,
    })
};

impl IntrMaskingInfo {
    fn enter(&mut self) {
        let machine = MachineImpl;
        let before = machine.interrupt_enable();
        machine.set_interrupt_enable(false);
        if self.nested_level == 0 {
            self.enable_before = before;
        }
        self.nested_level += 1;
    }

    fn exit(&mut self) {
        self.nested_level -= 1;
        if self.nested_level == 0 && self.enable_before {
            MachineImpl.set_interrupt_enable(true);
        }
    }
}

/// 访问期间自动关中断的 UP 内部可变性封装
pub struct UPIntrFreeCell<T> {
    inner: RefCell<T>,
}

unsafe impl<T> Sync for UPIntrFreeCell<T> {}
unsafe impl<T> Send for UPIntrFreeCell<T> {}

/// `UPIntrFreeCell` 的可变借用守卫，drop 时恢复中断状态
pub struct UPIntrRefMut<'a, T>(Option<RefMut<'a, T>>);

impl<T> UPIntrFreeCell<T> {
    /// # Safety
    /// 使用者保证仅在 UP 环境下使用
    pub unsafe fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    /// 屏蔽中断并取得独占访问；借用冲突直接 panic（RefCell 语义）
    pub fn exclusive_access(&self) -> UPIntrRefMut<'_, T> {
        INTR_MASKING_INFO.get_mut().enter();
        UPIntrRefMut(Some(self.inner.borrow_mut()))
    }

    /// 在独占访问会话中执行闭包，自动管理屏蔽与恢复
    pub fn exclusive_session<F, V>(&self, f: F) -> V
    where
        F: FnOnce(&mut T) -> V,
    {
        let mut inner = self.exclusive_access();
        f(inner.deref_mut())
    }
}

impl<'a, T> Drop for UPIntrRefMut<'a, T> {
    fn drop(&mut self) {
        self.0 = None;
        INTR_MASKING_INFO.get_mut().exit();
    }
}

impl<'a, T> Deref for UPIntrRefMut<'a, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref().unwrap().deref()
    }
}

impl<'a, T> DerefMut for UPIntrRefMut<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut().unwrap().deref_mut()
    }
}
