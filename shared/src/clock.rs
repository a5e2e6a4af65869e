use crate::tick::Tick;

/// Estimates the remote peer's current tick from the ticks stamped on its
/// packets.
///
/// The estimate trails the latest received tick by a delay kept inside
/// `[delay_min, delay_max]`. It normally advances one tick per local update,
/// speeds up or holds back by a tick when it drifts out of the window, and
/// snaps straight back to the desired delay when it has drifted too far.
/// See <http://www.gamedev.net/topic/652186-de-jitter-buffer-on-both-the-client-and-server/>
#[derive(Debug, Clone)]
pub struct Clock {
    remote_rate: i32,
    delay_min: i32,
    delay_max: i32,
    delay_desired: u32,
    should_update_estimate: bool,
    should_tick: bool,
    estimated_remote: Tick,
    latest_remote: Tick,
}

impl Clock {
    pub fn new(remote_send_rate: u32, delay_min: u32, delay_max: u32) -> Self {
        assert!(delay_min <= delay_max, "clock delay window is inverted");
        Self {
            remote_rate: remote_send_rate as i32,
            delay_min: delay_min as i32,
            delay_max: delay_max as i32,
            delay_desired: ((delay_max - delay_min) / 2) + delay_min,
            should_update_estimate: false,
            should_tick: false,
            estimated_remote: Tick::INVALID,
            latest_remote: Tick::INVALID,
        }
    }

    /// Smoothed estimate of the remote tick
    pub fn estimated_remote(&self) -> Tick {
        self.estimated_remote
    }

    /// Highest tick received from the remote peer
    pub fn latest_remote(&self) -> Tick {
        self.latest_remote
    }

    /// False until a second, newer remote tick has been seen
    pub fn should_tick(&self) -> bool {
        self.should_tick
    }

    pub fn delay_desired(&self) -> u32 {
        self.delay_desired
    }

    /// Records a tick stamped on an incoming packet
    pub fn update_latest(&mut self, latest_tick: Tick) {
        if !latest_tick.is_valid() {
            return;
        }

        if !self.latest_remote.is_valid() {
            self.latest_remote = latest_tick;
        }

        if !self.estimated_remote.is_valid() {
            self.estimated_remote = self.latest_remote.saturating_sub(self.delay_desired);
        }

        if latest_tick > self.latest_remote {
            self.latest_remote = latest_tick;
            self.should_update_estimate = true;
            self.should_tick = true;
        }
    }

    /// Advances the estimate by one local tick
    pub fn update(&mut self) {
        if !self.should_tick {
            return;
        }

        self.estimated_remote += 1;
        if !self.should_update_estimate {
            return;
        }

        let delta = self.latest_remote - self.estimated_remote;

        if self.should_snap(delta) {
            self.estimated_remote = self.latest_remote.saturating_sub(self.delay_desired);
        } else if delta > self.delay_max {
            self.estimated_remote += 1;
        } else if delta < self.delay_min {
            self.estimated_remote = self.estimated_remote.saturating_sub(1);
        } else {
            self.should_update_estimate = false;
        }
    }

    fn should_snap(&self, delta: i32) -> bool {
        delta < (self.delay_min - self.remote_rate) || delta > (self.delay_max + self.remote_rate)
    }
}
