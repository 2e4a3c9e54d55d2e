//! Callback - 구독자 콜백 정의
//!
//! 콜백은 두 가지 형태가 있습니다.
//!
//! - `Callback::Sync`: 전달 스레드에서 락을 잡은 채 즉시 실행
//! - `Callback::Task`: TaskSupervisor가 tokio 태스크로 실행, `CancellationToken`으로
//!   취소 신호를 관찰해야 함 (강제 종료하지 않음)
//!
//! ```ignore
//! let on_start = Callback::sync(|bundle: &Bundle| {
//!     println!("started {}", bundle.symbolic_name);
//!     Ok(())
//! });
//!
//! let warm_cache = Callback::task(|bundle: Bundle, token: CancellationToken| async move {
//!     tokio::select! {
//!         _ = token.cancelled() => Ok(()),
//!         _ = load_resources(&bundle) => Ok(()),
//!     }
//! });
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use lifecycle_foundation::UpdateKind;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 비동기 콜백이 반환하는 future
pub type TaskFuture = BoxFuture<'static, anyhow::Result<()>>;

type SyncFn<T> = dyn Fn(&T) -> anyhow::Result<()> + Send + Sync;
type TaskFn<T> = dyn Fn(T, CancellationToken) -> TaskFuture + Send + Sync;

// ============================================================================
// Callback
// ============================================================================

/// 구독자 콜백 (동기 / 비동기)
pub enum Callback<T> {
    /// 전달 스레드에서 동기 실행
    Sync(Arc<SyncFn<T>>),

    /// TaskSupervisor에서 비동기 실행
    Task(Arc<TaskFn<T>>),

    /// 아무것도 하지 않음
    Noop,
}

impl<T: Send + 'static> Callback<T> {
    /// 동기 콜백 생성
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Callback::Sync(Arc::new(f))
    }

    /// 비동기 콜백 생성
    pub fn task<F, Fut>(f: F) -> Self
    where
        F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Callback::Task(Arc::new(move |value, token| f(value, token).boxed()))
    }

    pub fn noop() -> Self {
        Callback::Noop
    }

    /// 비동기 실행 여부
    pub fn is_task(&self) -> bool {
        matches!(self, Callback::Task(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Callback::Sync(_) => "sync",
            Callback::Task(_) => "task",
            Callback::Noop => "noop",
        }
    }

    /// 입력 타입 변환 - `S`를 받아 `f`로 `T`를 만든 뒤 이 콜백에 전달
    ///
    /// 동기/비동기 형태는 그대로 유지됩니다.
    pub fn map_input<S, F>(self, f: F) -> Callback<S>
    where
        S: Send + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        match self {
            Callback::Sync(inner) => Callback::Sync(Arc::new(move |s: &S| inner(&f(s)))),
            Callback::Task(inner) => {
                Callback::Task(Arc::new(move |s: S, token| inner(f(&s), token)))
            }
            Callback::Noop => Callback::Noop,
        }
    }

    /// 호출 시점에 `skip()`이 참이면 콜백 본문을 건너뜀
    ///
    /// 건너뛰어도 전달은 된 것으로 취급됩니다 (열림/닫힘 상태는 그대로 갱신).
    pub fn skip_when<P>(self, skip: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        match self {
            Callback::Sync(inner) => Callback::Sync(Arc::new(move |value: &T| {
                if skip() {
                    return Ok(());
                }
                inner(value)
            })),
            Callback::Task(inner) => Callback::Task(Arc::new(move |value: T, token| {
                if skip() {
                    return futures::future::ready(Ok(())).boxed();
                }
                inner(value, token)
            })),
            Callback::Noop => Callback::Noop,
        }
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Callback::Sync(f) => Callback::Sync(Arc::clone(f)),
            Callback::Task(f) => Callback::Task(Arc::clone(f)),
            Callback::Noop => Callback::Noop,
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Callback::Sync(_) => "Sync",
            Callback::Task(_) => "Task",
            Callback::Noop => "Noop",
        };
        write!(f, "Callback::{}", kind)
    }
}

// ============================================================================
// Filter
// ============================================================================

/// 구독자 필터 - 디스패치 시점마다 평가됨 (캐시하지 않음)
pub struct Filter<E>(Arc<dyn Fn(&E) -> bool + Send + Sync>);

impl<E> Filter<E> {
    pub fn new(f: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// 모든 엔티티 허용
    pub fn all() -> Self {
        Self(Arc::new(|_| true))
    }

    pub fn matches(&self, entity: &E) -> bool {
        (self.0)(entity)
    }
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> Default for Filter<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter")
    }
}

// ============================================================================
// Updated
// ============================================================================

/// update 콜백 인자
#[derive(Debug, Clone, PartialEq)]
pub struct Updated<E> {
    pub entity: E,
    pub kind: UpdateKind,
}

/// panic payload에서 메시지 추출
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("bad bundle")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "bad bundle");
    }

    #[test]
    fn test_sync_callback_invocation() {
        let cb = Callback::sync(|v: &u32| {
            anyhow::ensure!(*v < 10, "too large: {}", v);
            Ok(())
        });

        let Callback::Sync(f) = cb.clone() else {
            panic!("expected sync callback");
        };
        assert!(f(&3).is_ok());
        assert!(f(&30).is_err());
        assert_eq!(cb.kind(), "sync");
        assert!(!cb.is_task());
    }

    #[tokio::test]
    async fn test_task_callback_observes_token() {
        let cb = Callback::task(|_: u32, token: CancellationToken| async move {
            token.cancelled().await;
            Ok(())
        });
        assert!(cb.is_task());

        let Callback::Task(f) = cb else {
            panic!("expected task callback");
        };
        let token = CancellationToken::new();
        let fut = f(1, token.clone());
        token.cancel();
        assert!(fut.await.is_ok());
    }

    #[test]
    fn test_map_input_keeps_shape() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = seen.clone();
        let cb = Callback::sync(move |v: &String| {
            s.lock().push(v.clone());
            Ok(())
        })
        .map_input(|n: &u32| format!("#{}", n));

        let Callback::Sync(f) = cb else {
            panic!("expected sync callback");
        };
        f(&7).unwrap();
        assert_eq!(*seen.lock(), vec!["#7".to_string()]);

        let task = Callback::task(|_: String, _token: CancellationToken| async { Ok(()) })
            .map_input(|n: &u32| n.to_string());
        assert!(task.is_task());
        assert!(matches!(
            Callback::<String>::noop().map_input(|n: &u32| n.to_string()),
            Callback::Noop
        ));
    }

    #[tokio::test]
    async fn test_skip_when_suppresses_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let skipping = Arc::new(AtomicBool::new(false));

        let c = calls.clone();
        let s = skipping.clone();
        let cb = Callback::sync(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .skip_when(move || s.load(Ordering::SeqCst));
        let Callback::Sync(f) = cb else {
            panic!("expected sync callback");
        };

        f(&1).unwrap();
        skipping.store(true, Ordering::SeqCst);
        f(&2).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let c = calls.clone();
        let task = Callback::task(move |_: u32, _token: CancellationToken| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .skip_when(|| true);
        let Callback::Task(f) = task else {
            panic!("expected task callback");
        };
        f(3, CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter() {
        let even = Filter::new(|v: &u32| v % 2 == 0);
        assert!(even.matches(&4));
        assert!(!even.matches(&5));
        assert!(Filter::<u32>::all().matches(&5));
    }
}
