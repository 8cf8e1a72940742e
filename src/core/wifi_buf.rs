use crate::core::memory::regions;
use crate::utils::align_up;

const ADDR_MASK: u16 = (regions::WIFI_RAM_SIZE - 2) as u16;

/// Circular buffer window over wifi ram.
///
/// RX and TX both use this type. For RX the window is programmed through `W_RXBUF_BEGIN` and
/// `W_RXBUF_END`, TX always covers the whole ram (`begin == end`, wrapping at the end of ram).
/// `wr_csr`, `rd_addr` and `gap` are byte addresses, `wr_addr`, `read_csr` and `gap_disp` count
/// halfwords, which is how the hardware registers store them.
#[derive(Copy, Clone, Debug, Default)]
pub struct WifiBuf {
    pub begin: u16,
    pub end: u16,
    pub wr_csr: u16,
    pub wr_addr: u16,
    pub rd_addr: u16,
    pub read_csr: u16,
    pub gap: u16,
    pub gap_disp: u16,
    pub count: u16,
}

impl WifiBuf {
    pub fn new() -> Self {
        WifiBuf::default()
    }

    fn window(&self) -> Option<(u16, u16)> {
        let begin = self.begin & ADDR_MASK;
        let end = self.end & ADDR_MASK;
        if end > begin {
            Some((begin, end))
        } else {
            None
        }
    }

    pub fn wrap(&self, addr: u16) -> u16 {
        match self.window() {
            Some((begin, end)) if addr >= end => begin + (addr - end) % (end - begin),
            _ => addr & ADDR_MASK,
        }
    }

    fn gap_end(&self) -> u16 {
        (self.gap & ADDR_MASK) + (self.gap_disp << 1)
    }

    pub fn in_gap(&self, addr: u16) -> bool {
        self.gap_disp != 0 && addr >= (self.gap & ADDR_MASK) && addr < self.gap_end()
    }

    /// Cursor movement of the software facing side: one halfword forward, over the gap, back to
    /// `begin` once `end` is reached.
    pub fn advance(&self, addr: u16) -> u16 {
        let next = self.wrap(addr.wrapping_add(2));
        if self.in_gap(next) {
            self.wrap(self.gap_end())
        } else {
            next
        }
    }

    /// Cursor movement of the hardware side while storing a received frame, ignores the gap.
    pub fn advance_write(&self, addr: u16) -> u16 {
        self.wrap(addr.wrapping_add(2))
    }

    pub fn align_write(&mut self) {
        self.wr_csr = self.wrap(align_up(self.wr_csr as u32, 4) as u16);
    }

    /// Takes one halfword off the pending count, true if that emptied it.
    pub fn consume(&mut self) -> bool {
        if self.count > 0 {
            self.count -= 1;
            self.count == 0
        } else {
            false
        }
    }
}
