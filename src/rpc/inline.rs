//! Fixed-capacity, type-erased callable holder.
//!
//! [`InlineCallable`] stores any callable matching a signature
//! `Fn(A1, .., An) -> R` inside a word-aligned buffer that lives inline in
//! the holder itself. No heap allocation happens per callable; the concrete
//! type is remembered through a table of monomorphised function pointers.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ InlineCallable<Args, R>                      │
//! │  storage: [usize; INLINE_WORDS]  ◀── F lives │
//! │  vtable:  VTable ───────────┐                │
//! └─────────────────────────────┼────────────────┘
//!                               ▼
//!               ┌───────────────────────────────┐
//!               │ invoke: fn(*const u8, Args)->R│
//!               │ drop:   fn(*mut u8)           │
//!               └───────────────────────────────┘
//! ```
//!
//! Rust moves are bitwise relocations, so relocating a holder needs no entry
//! in the table. An explicit [`take`](InlineCallable::take) leaves the source
//! empty; invoking an empty holder fails with [`Error::InvalidState`].
//!
//! A callable that is too large or too strictly aligned for the buffer is
//! rejected at compile time when [`InlineCallable::new`] is instantiated.

use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ptr;

use crate::error::{Error, Result};

/// Buffer size in machine words.
pub const INLINE_WORDS: usize = 4;

/// Buffer capacity in bytes.
pub const INLINE_CAPACITY: usize = INLINE_WORDS * mem::size_of::<usize>();

/// Strictest alignment a stored callable may require.
pub const INLINE_ALIGN: usize = mem::align_of::<usize>();

type Storage = [MaybeUninit<usize>; INLINE_WORDS];

// ---------------------------------------------------------------------------
// Callable: adapts `Fn(A1, .., An) -> R` to a single tuple argument
// ---------------------------------------------------------------------------

/// A callable taking its arguments as one tuple.
///
/// Implemented for every `Fn` of arity 0 through 6, so plain functions and
/// closures can be stored without wrapping.
pub trait Callable<Args> {
    type Output;

    fn call(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<F, R, $($arg),*> Callable<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R,
        {
            type Output = R;

            #[allow(non_snake_case, clippy::unused_unit)]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> R {
                (self)($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);

// ---------------------------------------------------------------------------
// Dispatch table
// ---------------------------------------------------------------------------

struct VTable<Args, R> {
    invoke: unsafe fn(*const u8, Args) -> R,
    drop: unsafe fn(*mut u8),
}

struct VTableFor<F, Args, R>(PhantomData<(F, Args, R)>);

impl<F, Args, R> VTableFor<F, Args, R>
where
    F: Callable<Args, Output = R>,
{
    const VTABLE: VTable<Args, R> = VTable {
        invoke: invoke_erased::<F, Args, R>,
        drop: drop_erased::<F>,
    };
}

/// # Safety
/// `ptr` must point at a live, properly aligned `F`.
unsafe fn invoke_erased<F, Args, R>(ptr: *const u8, args: Args) -> R
where
    F: Callable<Args, Output = R>,
{
    // SAFETY: guaranteed by the caller.
    let f = unsafe { &*ptr.cast::<F>() };
    f.call(args)
}

/// # Safety
/// `ptr` must point at a live, properly aligned `F` that is never used again.
unsafe fn drop_erased<F>(ptr: *mut u8) {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::drop_in_place(ptr.cast::<F>()) }
}

// ---------------------------------------------------------------------------
// InlineCallable
// ---------------------------------------------------------------------------

/// Type-erased callable of signature `Args -> R` stored without allocation.
pub struct InlineCallable<Args, R> {
    storage: Storage,
    /// `Some` exactly while `storage` holds a live callable.
    vtable: Option<VTable<Args, R>>,
    /// The erased callable may be neither `Send` nor `Sync`.
    _not_send: PhantomData<*const ()>,
}

impl<Args, R> InlineCallable<Args, R> {
    /// Store `f` in the inline buffer.
    pub fn new<F>(f: F) -> Self
    where
        F: Callable<Args, Output = R> + 'static,
    {
        const {
            assert!(
                mem::size_of::<F>() <= INLINE_CAPACITY,
                "callable does not fit the inline buffer"
            );
            assert!(
                mem::align_of::<F>() <= INLINE_ALIGN,
                "callable alignment exceeds the inline buffer alignment"
            );
        }

        let mut storage: Storage = [MaybeUninit::uninit(); INLINE_WORDS];
        // SAFETY: size and alignment were checked above and the buffer is
        // word aligned; the slot is uninitialised so nothing is overwritten.
        unsafe { ptr::write(storage.as_mut_ptr().cast::<F>(), f) };

        Self {
            storage,
            vtable: Some(VTableFor::<F, Args, R>::VTABLE),
            _not_send: PhantomData,
        }
    }

    /// A holder with no callable. Invoking it fails.
    pub const fn empty() -> Self {
        Self {
            storage: [MaybeUninit::uninit(); INLINE_WORDS],
            vtable: None,
            _not_send: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vtable.is_none()
    }

    /// Move the held callable into a new holder, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }

    /// Call the held callable.
    pub fn invoke(&self, args: Args) -> Result<R> {
        let vtable = self.vtable.as_ref().ok_or(Error::InvalidState)?;
        // SAFETY: a vtable is only present while storage holds the live
        // callable it was built for.
        Ok(unsafe { (vtable.invoke)(self.storage.as_ptr().cast::<u8>(), args) })
    }
}

impl<Args, R> Default for InlineCallable<Args, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args, R> Drop for InlineCallable<Args, R> {
    fn drop(&mut self) {
        if let Some(vtable) = self.vtable.take() {
            // SAFETY: the vtable matched the live callable; clearing it first
            // guarantees the callable is dropped at most once.
            unsafe { (vtable.drop)(self.storage.as_mut_ptr().cast::<u8>()) }
        }
    }
}

impl<Args, R> fmt::Debug for InlineCallable<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineCallable")
            .field("empty", &self.is_empty())
            .finish()
    }
}
