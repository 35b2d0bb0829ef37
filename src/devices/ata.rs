//! ATA PIO disk driver, LBA28, one sector per command.
//!
//! No IRQs are used. Every wait polls the status register against a fixed
//! iteration budget and gives up with [`FsError::DeviceTimeout`] instead of
//! spinning forever. Register access goes through [`AtaBus`] so the protocol
//! can run against real ports or a simulated controller.

use crate::constants::ata::*;
use crate::filesys::{BlockDevice, FsError, Sector, SECTOR_SIZE};
use bitflags::bitflags;
use x86_64::instructions::port::Port;

bitflags! {
    /// ATA status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AtaStatus: u8 {
        const BSY = 0x80;
        const DRDY = 0x40;
        const DF = 0x20;
        const DRQ = 0x08;
        const ERR = 0x01;
        const _ = !0;
    }
}

impl AtaStatus {
    fn is_failed(self) -> bool {
        self.intersects(AtaStatus::ERR | AtaStatus::DF)
    }
}

/// Byte and word access to I/O ports
pub trait AtaBus: Send + Sync {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
    fn read_u16(&mut self, port: u16) -> u16;
    fn write_u16(&mut self, port: u16, value: u16);
}

/// [`AtaBus`] over the x86 I/O port space
pub struct PortBus {
    _private: (),
}

impl PortBus {
    /// # Safety
    ///
    /// The caller must own the ATA channel the driver will be pointed at;
    /// port writes have side effects on whatever device answers there.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl AtaBus for PortBus {
    fn read_u8(&mut self, port: u16) -> u8 {
        unsafe { Port::<u8>::new(port).read() }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        unsafe { Port::<u8>::new(port).write(value) }
    }

    fn read_u16(&mut self, port: u16) -> u16 {
        unsafe { Port::<u16>::new(port).read() }
    }

    fn write_u16(&mut self, port: u16, value: u16) {
        unsafe { Port::<u16>::new(port).write(value) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    Master,
    Slave,
}

impl Drive {
    fn select_byte(self) -> u8 {
        match self {
            Drive::Master => DRIVE_MASTER_LBA,
            Drive::Slave => DRIVE_SLAVE_LBA,
        }
    }
}

/// One drive on an ATA channel
pub struct AtaPio<B: AtaBus> {
    bus: B,
    /// Command block base port
    base: u16,
    drive: Drive,
    /// Addressable sectors, the LBA28 limit until IDENTIFY says otherwise
    sector_count: u64,
    /// Status polls allowed per wait
    poll_budget: usize,
}

impl<B: AtaBus> AtaPio<B> {
    pub fn new(bus: B, base: u16, drive: Drive) -> Self {
        Self {
            bus,
            base,
            drive,
            sector_count: LBA28_MAX_SECTORS,
            poll_budget: ATA_POLL_BUDGET,
        }
    }

    pub fn with_poll_budget(mut self, poll_budget: usize) -> Self {
        self.poll_budget = poll_budget;
        self
    }

    pub fn sector_count(&self) -> u64 {
        self.sector_count
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn status(&mut self) -> AtaStatus {
        AtaStatus::from_bits_retain(self.bus.read_u8(self.base + REG_STATUS_COMMAND))
    }

    /// Selects the drive with LBA bits 24..28 and lets it settle
    fn select(&mut self, lba: u64) {
        let head = self.drive.select_byte() | ((lba >> 24) & 0x0F) as u8;
        self.bus.write_u8(self.base + REG_DRIVE_HEAD, head);
        for _ in 0..SELECT_SETTLE_READS {
            let _ = self.status();
        }
    }

    fn device_error(&mut self, status: AtaStatus) -> FsError {
        let error = self.bus.read_u8(self.base + REG_ERROR);
        log::error!("ata: device error, status {:?}, error register {:#04x}", status, error);
        FsError::DeviceError
    }

    /// Polls until BSY clears
    fn wait_not_busy(&mut self) -> Result<AtaStatus, FsError> {
        for _ in 0..self.poll_budget {
            let status = self.status();
            if status.is_failed() {
                return Err(self.device_error(status));
            }
            if !status.contains(AtaStatus::BSY) {
                return Ok(status);
            }
            core::hint::spin_loop();
        }
        log::warn!("ata: timed out waiting for BSY to clear");
        Err(FsError::DeviceTimeout)
    }

    /// Polls until the drive requests data
    fn wait_data_ready(&mut self) -> Result<(), FsError> {
        for _ in 0..self.poll_budget {
            let status = self.status();
            if status.is_failed() {
                return Err(self.device_error(status));
            }
            if !status.contains(AtaStatus::BSY) && status.contains(AtaStatus::DRQ) {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        log::warn!("ata: timed out waiting for DRQ");
        Err(FsError::DeviceTimeout)
    }

    /// Programs a one-sector transfer at `lba` and issues `command`
    fn issue(&mut self, lba: u64, command: u8) -> Result<(), FsError> {
        if lba >= self.sector_count || lba >= LBA28_MAX_SECTORS {
            return Err(FsError::OutOfRange);
        }

        self.select(lba);
        self.wait_not_busy()?;

        self.bus.write_u8(self.base + REG_SECTOR_COUNT, 1);
        self.bus.write_u8(self.base + REG_LBA_LO, lba as u8);
        self.bus.write_u8(self.base + REG_LBA_MID, (lba >> 8) as u8);
        self.bus.write_u8(self.base + REG_LBA_HI, (lba >> 16) as u8);
        self.bus.write_u8(self.base + REG_STATUS_COMMAND, command);
        Ok(())
    }

    /// Asks the drive for its identify block and records its LBA28 size.
    pub fn identify(&mut self) -> Result<u64, FsError> {
        self.select(0);
        self.bus.write_u8(self.base + REG_SECTOR_COUNT, 0);
        self.bus.write_u8(self.base + REG_LBA_LO, 0);
        self.bus.write_u8(self.base + REG_LBA_MID, 0);
        self.bus.write_u8(self.base + REG_LBA_HI, 0);
        self.bus.write_u8(self.base + REG_STATUS_COMMAND, CMD_IDENTIFY);

        if self.status().is_empty() {
            log::info!("ata: no drive on channel {:#x}", self.base);
            return Err(FsError::DeviceError);
        }
        self.wait_not_busy()?;

        // ATAPI and SATA devices put a signature in the LBA registers
        let mid = self.bus.read_u8(self.base + REG_LBA_MID);
        let hi = self.bus.read_u8(self.base + REG_LBA_HI);
        if mid != 0 || hi != 0 {
            log::info!("ata: device on channel {:#x} is not plain ATA", self.base);
            return Err(FsError::DeviceError);
        }

        self.wait_data_ready()?;
        let mut words = [0u16; WORDS_PER_SECTOR];
        for word in words.iter_mut() {
            *word = self.bus.read_u16(self.base + REG_DATA);
        }

        // Words 60-61: 28-bit LBA sector count
        self.sector_count = ((words[61] as u64) << 16) | words[60] as u64;
        log::info!(
            "ata: drive found, {} sectors ({} KiB)",
            self.sector_count,
            self.sector_count / 2
        );
        Ok(self.sector_count)
    }

    pub fn read_sector(&mut self, lba: u64, buf: &mut Sector) -> Result<(), FsError> {
        self.issue(lba, CMD_READ_SECTORS)?;
        self.wait_data_ready()?;

        for chunk in buf.chunks_exact_mut(2) {
            let word = self.bus.read_u16(self.base + REG_DATA);
            chunk.copy_from_slice(&word.to_le_bytes());
        }

        self.wait_not_busy()?;
        Ok(())
    }

    /// Writes one sector. Returns only once the cache flush has completed.
    pub fn write_sector(&mut self, lba: u64, data: &Sector) -> Result<(), FsError> {
        self.issue(lba, CMD_WRITE_SECTORS)?;
        self.wait_data_ready()?;

        for chunk in data.chunks_exact(2) {
            self.bus
                .write_u16(self.base + REG_DATA, u16::from_le_bytes([chunk[0], chunk[1]]));
        }

        self.wait_not_busy()?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), FsError> {
        self.bus.write_u8(self.base + REG_STATUS_COMMAND, CMD_CACHE_FLUSH);
        self.wait_not_busy()?;
        Ok(())
    }
}

impl<B: AtaBus> BlockDevice for AtaPio<B> {
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FsError> {
        let buf: &mut Sector = buf.try_into().map_err(|_| FsError::InvalidBuffer)?;
        self.read_sector(block_num, buf)
    }

    fn write_block(&mut self, block_num: u64, buf: &[u8]) -> Result<(), FsError> {
        let buf: &Sector = buf.try_into().map_err(|_| FsError::InvalidBuffer)?;
        self.write_sector(block_num, buf)
    }

    fn block_size(&self) -> usize {
        SECTOR_SIZE
    }

    fn total_blocks(&self) -> u64 {
        self.sector_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ports::ATA_PRIMARY_BASE;
    use crate::filesys::fat16::{Fat16, Geometry};
    use crate::filesys::FileSystem;
    use alloc::{boxed::Box, vec, vec::Vec};

    const BASE: u16 = ATA_PRIMARY_BASE;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Idle,
        DataOut,
        DataIn { lba: u64 },
    }

    /// Register-level model of a single ATA drive
    struct SimulatedDisk {
        image: Vec<u8>,
        registers: [u8; 8],
        buffer: [u16; WORDS_PER_SECTOR],
        index: usize,
        phase: Phase,
        /// Status polls that report BSY after each command
        busy_polls: usize,
        busy_left: usize,
        stuck_busy: bool,
        fail: bool,
        absent: bool,
        status_reads: usize,
        commands: Vec<u8>,
        register_writes: Vec<(u16, u8)>,
    }

    impl SimulatedDisk {
        fn new(sectors: usize) -> Self {
            Self {
                image: vec![0; sectors * SECTOR_SIZE],
                registers: [0; 8],
                buffer: [0; WORDS_PER_SECTOR],
                index: 0,
                phase: Phase::Idle,
                busy_polls: 0,
                busy_left: 0,
                stuck_busy: false,
                fail: false,
                absent: false,
                status_reads: 0,
                commands: Vec::new(),
                register_writes: Vec::new(),
            }
        }

        fn sectors(&self) -> u64 {
            (self.image.len() / SECTOR_SIZE) as u64
        }

        fn lba(&self) -> u64 {
            self.registers[REG_LBA_LO as usize] as u64
                | (self.registers[REG_LBA_MID as usize] as u64) << 8
                | (self.registers[REG_LBA_HI as usize] as u64) << 16
                | ((self.registers[REG_DRIVE_HEAD as usize] & 0x0F) as u64) << 24
        }

        fn sector_range(&self, lba: u64) -> Option<core::ops::Range<usize>> {
            let start = lba as usize * SECTOR_SIZE;
            (start + SECTOR_SIZE <= self.image.len()).then(|| start..start + SECTOR_SIZE)
        }

        fn run_command(&mut self, command: u8) {
            self.commands.push(command);
            self.busy_left = self.busy_polls;
            self.index = 0;
            match command {
                CMD_READ_SECTORS => {
                    let lba = self.lba();
                    let mut bytes = [0u8; SECTOR_SIZE];
                    if let Some(range) = self.sector_range(lba) {
                        bytes.copy_from_slice(&self.image[range]);
                    }
                    for (word, pair) in self.buffer.iter_mut().zip(bytes.chunks_exact(2)) {
                        *word = u16::from_le_bytes([pair[0], pair[1]]);
                    }
                    self.phase = Phase::DataOut;
                }
                CMD_WRITE_SECTORS => {
                    self.phase = Phase::DataIn { lba: self.lba() };
                }
                CMD_IDENTIFY => {
                    self.buffer = [0; WORDS_PER_SECTOR];
                    let sectors = self.sectors();
                    self.buffer[60] = sectors as u16;
                    self.buffer[61] = (sectors >> 16) as u16;
                    self.phase = Phase::DataOut;
                }
                _ => self.phase = Phase::Idle,
            }
        }
    }

    impl AtaBus for SimulatedDisk {
        fn read_u8(&mut self, port: u16) -> u8 {
            let reg = port - BASE;
            if reg != REG_STATUS_COMMAND {
                return self.registers[reg as usize];
            }

            self.status_reads += 1;
            if self.absent {
                return 0;
            }
            if self.stuck_busy {
                return AtaStatus::BSY.bits();
            }
            if self.busy_left > 0 {
                self.busy_left -= 1;
                return AtaStatus::BSY.bits();
            }
            if self.fail {
                return (AtaStatus::DRDY | AtaStatus::ERR).bits();
            }
            match self.phase {
                Phase::Idle => AtaStatus::DRDY.bits(),
                _ => (AtaStatus::DRDY | AtaStatus::DRQ).bits(),
            }
        }

        fn write_u8(&mut self, port: u16, value: u8) {
            let reg = port - BASE;
            self.register_writes.push((reg, value));
            if reg == REG_STATUS_COMMAND {
                self.run_command(value);
            } else {
                self.registers[reg as usize] = value;
            }
        }

        fn read_u16(&mut self, _port: u16) -> u16 {
            let word = self.buffer[self.index];
            self.index += 1;
            if self.index == WORDS_PER_SECTOR {
                self.phase = Phase::Idle;
            }
            word
        }

        fn write_u16(&mut self, _port: u16, value: u16) {
            self.buffer[self.index] = value;
            self.index += 1;
            if self.index == WORDS_PER_SECTOR {
                if let Phase::DataIn { lba } = self.phase {
                    if let Some(range) = self.sector_range(lba) {
                        for (pair, word) in self.image[range].chunks_exact_mut(2).zip(self.buffer) {
                            pair.copy_from_slice(&word.to_le_bytes());
                        }
                    }
                }
                self.phase = Phase::Idle;
                self.busy_left = self.busy_polls;
            }
        }
    }

    fn drive(disk: SimulatedDisk) -> AtaPio<SimulatedDisk> {
        AtaPio::new(disk, BASE, Drive::Master).with_poll_budget(64)
    }

    #[test]
    fn test_read_programs_registers() {
        let mut disk = SimulatedDisk::new(16);
        disk.image[5 * SECTOR_SIZE..6 * SECTOR_SIZE].fill(0x42);
        disk.image[5 * SECTOR_SIZE] = 0x01;
        let mut ata = drive(disk);

        let mut buf = [0u8; SECTOR_SIZE];
        ata.read_sector(5, &mut buf).unwrap();
        assert_eq!(buf[0], 0x01);
        assert!(buf[1..].iter().all(|&b| b == 0x42));

        let sim = ata.bus();
        assert_eq!(sim.commands, vec![CMD_READ_SECTORS]);
        assert_eq!(
            sim.register_writes,
            vec![
                (REG_DRIVE_HEAD, 0xE0),
                (REG_SECTOR_COUNT, 1),
                (REG_LBA_LO, 5),
                (REG_LBA_MID, 0),
                (REG_LBA_HI, 0),
                (REG_STATUS_COMMAND, CMD_READ_SECTORS),
            ]
        );
        assert!(sim.status_reads >= SELECT_SETTLE_READS + 2);
    }

    #[test]
    fn test_lba_bits_split_across_registers() {
        let mut ata = AtaPio::new(SimulatedDisk::new(1), BASE, Drive::Slave).with_poll_budget(64);
        let mut buf = [0u8; SECTOR_SIZE];
        ata.read_sector(0x0123_4567, &mut buf).unwrap();

        let writes = &ata.bus().register_writes;
        assert_eq!(writes[0], (REG_DRIVE_HEAD, 0xF1));
        assert_eq!(writes[2], (REG_LBA_LO, 0x67));
        assert_eq!(writes[3], (REG_LBA_MID, 0x45));
        assert_eq!(writes[4], (REG_LBA_HI, 0x23));
    }

    #[test]
    fn test_write_flushes_cache() {
        let mut ata = drive(SimulatedDisk::new(16));
        let mut data = [0u8; SECTOR_SIZE];
        for (i, b) in data.iter_mut().enumerate() {
            *b = i as u8;
        }
        ata.write_sector(3, &data).unwrap();

        let sim = ata.bus();
        assert_eq!(sim.commands, vec![CMD_WRITE_SECTORS, CMD_CACHE_FLUSH]);
        assert_eq!(&sim.image[3 * SECTOR_SIZE..4 * SECTOR_SIZE], &data[..]);
    }

    #[test]
    fn test_busy_drive_is_waited_out() {
        let mut disk = SimulatedDisk::new(4);
        disk.busy_polls = 10;
        let mut ata = drive(disk);

        ata.write_sector(1, &[0x77; SECTOR_SIZE]).unwrap();
        let mut buf = [0u8; SECTOR_SIZE];
        ata.read_sector(1, &mut buf).unwrap();
        assert_eq!(buf, [0x77; SECTOR_SIZE]);
    }

    #[test]
    fn test_stuck_busy_times_out() {
        let mut disk = SimulatedDisk::new(4);
        disk.stuck_busy = true;
        let mut ata = drive(disk);

        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(ata.read_sector(0, &mut buf), Err(FsError::DeviceTimeout));
        // settle reads plus one exhausted budget
        assert_eq!(ata.bus().status_reads, SELECT_SETTLE_READS + 64);
    }

    #[test]
    fn test_error_bit_fails_immediately() {
        let mut disk = SimulatedDisk::new(4);
        disk.fail = true;
        let mut ata = drive(disk);

        assert_eq!(
            ata.write_sector(0, &[0u8; SECTOR_SIZE]),
            Err(FsError::DeviceError)
        );
        assert_eq!(ata.bus().status_reads, SELECT_SETTLE_READS + 1);
        assert!(ata.bus().commands.is_empty());
    }

    #[test]
    fn test_identify_sets_sector_count() {
        let mut ata = drive(SimulatedDisk::new(300));
        assert_eq!(ata.identify(), Ok(300));
        assert_eq!(ata.total_blocks(), 300);

        let mut buf = [0u8; SECTOR_SIZE];
        assert_eq!(ata.read_block(300, &mut buf), Err(FsError::OutOfRange));
        assert!(ata.read_block(299, &mut buf).is_ok());
    }

    #[test]
    fn test_identify_without_drive() {
        let mut disk = SimulatedDisk::new(4);
        disk.absent = true;
        let mut ata = drive(disk);
        assert_eq!(ata.identify(), Err(FsError::DeviceError));
    }

    #[test]
    fn test_block_device_checks_buffer() {
        let mut ata = drive(SimulatedDisk::new(4));
        let mut short = [0u8; 100];
        assert_eq!(ata.read_block(0, &mut short), Err(FsError::InvalidBuffer));
        assert_eq!(ata.write_block(0, &short), Err(FsError::InvalidBuffer));
        assert!(ata.bus().commands.is_empty());
    }

    #[test]
    fn test_volume_on_simulated_drive() {
        let mut ata = drive(SimulatedDisk::new(512));
        ata.identify().unwrap();

        let mut fs = Fat16::format(Box::new(ata), Geometry::DEFAULT).unwrap();
        fs.write_file("calc.txt", b"1+2*3").unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(fs.read_file("calc.txt", &mut buf), Ok(5));
        assert_eq!(&buf[..5], b"1+2*3");
    }
}
