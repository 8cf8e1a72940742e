use std::ops::{Deref, DerefMut};

pub const fn align_up(n: u32, align: u32) -> u32 {
    (n + align - 1) & !(align - 1)
}

pub type HeapMemU8<const SIZE: usize> = HeapMem<u8, SIZE>;

pub struct HeapMem<T: Sized, const SIZE: usize>(Box<[T; SIZE]>);

impl<T: Sized + Default + Copy, const SIZE: usize> HeapMem<T, SIZE> {
    pub fn new() -> Self {
        HeapMem(Box::new([T::default(); SIZE]))
    }
}

impl<T: Sized + Default + Copy, const SIZE: usize> Deref for HeapMem<T, SIZE> {
    type Target = Box<[T; SIZE]>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Sized + Default + Copy, const SIZE: usize> DerefMut for HeapMem<T, SIZE> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Sized + Default + Copy, const SIZE: usize> Default for HeapMem<T, SIZE> {
    fn default() -> Self {
        HeapMem::new()
    }
}

pub fn read_u16_le(mem: &[u8], addr: usize) -> u16 {
    u16::from_le_bytes([mem[addr], mem[addr + 1]])
}

pub fn write_u16_le(mem: &mut [u8], addr: usize, value: u16) {
    mem[addr..addr + 2].copy_from_slice(&value.to_le_bytes());
}
