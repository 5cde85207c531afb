//! 取得限速
//!
//! 站点的 robots.txt（Crawl-delay: 1）与连续下载限制对应的
//! 显式限速状态：上次调用时刻 + 调用计数，全部由适配器自身持有，
//! 不依赖进程级可变状态。延迟计算是 (状态, 当前时刻) 的纯函数，
//! 不实际休眠即可测试

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 下载限速配置
#[derive(Debug, Clone)]
pub struct DownloadPacerConfig {
    /// 每次下载之间的最小间隔
    pub interval: Duration,
    /// 每 N 次下载插入一次长等待；0 表示关闭
    pub long_wait_every: u32,
    /// 长等待时长
    pub long_wait: Duration,
}

impl Default for DownloadPacerConfig {
    fn default() -> Self {
        Self {
            // robots.txt の Crawl-delay: 1 に余裕を持たせる
            interval: Duration::from_millis(1100),
            long_wait_every: 10,
            long_wait: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Default)]
struct PacerState {
    last_call: Option<Instant>,
    counter: u32,
}

/// 逐话下载的限速器
///
/// - 每次下载间隔 `interval`
/// - 每 `long_wait_every` 次下载插入 `long_wait` 的长等待
/// - 间隔足够久后计数器归零（视为新的一轮连续下载）
pub struct DownloadPacer {
    config: DownloadPacerConfig,
    state: Mutex<PacerState>,
}

impl DownloadPacer {
    pub fn new(config: DownloadPacerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PacerState::default()),
        }
    }

    /// 等待到允许下一次下载为止
    pub async fn pace(&self) {
        let delay = {
            let mut state = self.state.lock().expect("pacer state poisoned");
            next_download_delay(&self.config, &mut state, Instant::now())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().expect("pacer state poisoned").last_call = Some(Instant::now());
    }
}

/// 计算本次下载前应等待的时长，并推进计数
fn next_download_delay(
    config: &DownloadPacerConfig,
    state: &mut PacerState,
    now: Instant,
) -> Duration {
    let max_wait = config.long_wait.max(config.interval);

    // 前回から十分経っていれば連続ダウンロードとは見なさない
    if let Some(last) = state.last_call {
        if now.duration_since(last) > max_wait {
            state.counter = 0;
        }
    }

    let delay = if state.counter > 0
        && config.long_wait_every > 0
        && state.counter % config.long_wait_every == 0
    {
        max_wait
    } else if state.counter > 0 {
        let elapsed = state
            .last_call
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        config.interval.saturating_sub(elapsed)
    } else {
        Duration::ZERO
    };

    state.counter += 1;
    delay
}

/// API 调用的限速器
///
/// 调用之间保证 `interval` 的间隔，首次调用不等待
pub struct ApiPacer {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl ApiPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// 等待到允许下一次 API 调用为止
    pub async fn pace(&self) {
        let delay = {
            let last = self.last_call.lock().expect("pacer state poisoned");
            next_api_delay(self.interval, *last, Instant::now())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        *self.last_call.lock().expect("pacer state poisoned") = Some(Instant::now());
    }
}

fn next_api_delay(interval: Duration, last_call: Option<Instant>, now: Instant) -> Duration {
    match last_call {
        None => Duration::ZERO,
        Some(last) => interval.saturating_sub(now.duration_since(last)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DownloadPacerConfig {
        DownloadPacerConfig {
            interval: Duration::from_millis(1100),
            long_wait_every: 10,
            long_wait: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_first_download_has_no_delay() {
        let mut state = PacerState::default();
        let delay = next_download_delay(&config(), &mut state, Instant::now());
        assert_eq!(delay, Duration::ZERO);
        assert_eq!(state.counter, 1);
    }

    #[test]
    fn test_back_to_back_downloads_wait_for_interval() {
        let config = config();
        let mut state = PacerState::default();
        let t0 = Instant::now();

        assert_eq!(next_download_delay(&config, &mut state, t0), Duration::ZERO);
        state.last_call = Some(t0);

        // 100ms 後の次リクエスト → 残り 1000ms 待つ
        let delay = next_download_delay(&config, &mut state, t0 + Duration::from_millis(100));
        assert_eq!(delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_no_delay_when_interval_already_elapsed() {
        let config = config();
        let mut state = PacerState::default();
        let t0 = Instant::now();

        next_download_delay(&config, &mut state, t0);
        state.last_call = Some(t0);

        let delay = next_download_delay(&config, &mut state, t0 + Duration::from_millis(1100));
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_long_wait_every_n_downloads() {
        let config = config();
        let mut state = PacerState::default();
        let mut now = Instant::now();

        for call in 0..10 {
            let delay = next_download_delay(&config, &mut state, now);
            if call == 0 {
                assert_eq!(delay, Duration::ZERO);
            }
            now += delay.max(Duration::from_millis(1));
            state.last_call = Some(now);
        }

        // 11 回目（counter=10）は長待機
        let delay = next_download_delay(&config, &mut state, now + Duration::from_millis(1));
        assert_eq!(delay, config.long_wait);
    }

    #[test]
    fn test_counter_resets_after_long_idle() {
        let config = config();
        let mut state = PacerState {
            last_call: Some(Instant::now()),
            counter: 10,
        };
        let idle = config.long_wait + Duration::from_secs(1);
        let now = state.last_call.unwrap() + idle;

        let delay = next_download_delay(&config, &mut state, now);
        // カウンタが戻るので長待機にならない
        assert_eq!(delay, Duration::ZERO);
        assert_eq!(state.counter, 1);
    }

    #[test]
    fn test_api_pacer_first_call_free_then_spaced() {
        let interval = Duration::from_secs(3);
        let t0 = Instant::now();

        assert_eq!(next_api_delay(interval, None, t0), Duration::ZERO);
        assert_eq!(
            next_api_delay(interval, Some(t0), t0 + Duration::from_secs(1)),
            Duration::from_secs(2)
        );
        assert_eq!(
            next_api_delay(interval, Some(t0), t0 + Duration::from_secs(4)),
            Duration::ZERO
        );
    }
}
