//! Dispatch and fan-out through the public API, with stub decoders standing
//! in for the network-bound hosts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use embed_resolver::{
    ns, resolve_all, CacheStore, DecodeError, DecodeResult, Decoder, EmbedReference, Host,
    Language, NamespacePolicy, ResolvedStream, Resolver,
};

enum Behavior {
    Succeed,
    Fail,
    Hang,
}

struct StubDecoder {
    host: Host,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl StubDecoder {
    fn new(host: Host, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            host,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Decoder for StubDecoder {
    fn host(&self) -> Host {
        self.host
    }

    async fn decode(&self, embed_url: &str) -> DecodeResult<ResolvedStream> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => ResolvedStream::with_referer(
                format!("https://cdn.example/{}/{n}.m3u8", self.host.key()),
                embed_url,
            ),
            Behavior::Fail => Err(DecodeError::NotFound("stub source")),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(DecodeError::NotFound("unreachable"))
            }
        }
    }
}

fn resolver(stubs: &[&Arc<StubDecoder>]) -> Resolver {
    let decoders: Vec<Arc<dyn Decoder>> = stubs
        .iter()
        .map(|s| Arc::clone(*s) as Arc<dyn Decoder>)
        .collect();
    Resolver::new(Arc::new(CacheStore::new()), decoders)
}

#[tokio::test]
async fn unknown_host_never_invokes_a_decoder() {
    let voe = StubDecoder::new(Host::Voe, Behavior::Succeed);
    let resolver = resolver(&[&voe]);

    assert!(resolver.resolve("https://netu.example/e/1", "netu").await.is_none());
    assert!(resolver.resolve("https://voe.example/e/1", "").await.is_none());
    assert_eq!(voe.calls(), 0);
}

#[tokio::test]
async fn registered_host_without_decoder_is_absent() {
    let voe = StubDecoder::new(Host::Voe, Behavior::Succeed);
    let resolver = resolver(&[&voe]);

    assert!(resolver.resolve("https://uqload.example/e/1", "uqload").await.is_none());
    assert_eq!(voe.calls(), 0);
}

#[tokio::test]
async fn single_use_hosts_bypass_the_cache() {
    let dood = StubDecoder::new(Host::Dood, Behavior::Succeed);
    let filmoon = StubDecoder::new(Host::Filmoon, Behavior::Succeed);
    let resolver = resolver(&[&dood, &filmoon]);

    let first = resolver.resolve("https://dood.example/e/1", "dood").await.unwrap();
    let second = resolver.resolve("https://dood.example/e/1", "dood").await.unwrap();
    assert_ne!(first.direct_url(), second.direct_url());
    assert_eq!(dood.calls(), 2);

    resolver.resolve("https://filmoon.example/e/1", "filmoon").await.unwrap();
    resolver.resolve("https://filmoon.example/e/1", "filmoon").await.unwrap();
    assert_eq!(filmoon.calls(), 2);

    assert!(resolver.cache().stats().get(ns::RESOLVED).is_none());
}

#[tokio::test]
async fn cached_result_served_until_expiry() {
    let policies = HashMap::from([(
        ns::RESOLVED.to_string(),
        NamespacePolicy {
            ttl: Duration::from_millis(50),
            max_entries: 10,
        },
    )]);
    let uqload = StubDecoder::new(Host::Uqload, Behavior::Succeed);
    let resolver = Resolver::new(
        Arc::new(CacheStore::with_policies(policies)),
        [Arc::clone(&uqload) as Arc<dyn Decoder>],
    );

    let url = "https://uqload.example/embed-1.html";
    let first = resolver.resolve(url, "uqload").await.unwrap();
    let cached = resolver.resolve(url, "uqload").await.unwrap();
    assert_eq!(first, cached);
    assert_eq!(uqload.calls(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    let fresh = resolver.resolve(url, "uqload").await.unwrap();
    assert_ne!(first, fresh);
    assert_eq!(uqload.calls(), 2);
}

#[tokio::test]
async fn fan_out_keeps_order_and_drops_failures() {
    let premium = StubDecoder::new(Host::Premium, Behavior::Succeed);
    let vidzy = StubDecoder::new(Host::Vidzy, Behavior::Fail);
    let voe = StubDecoder::new(Host::Voe, Behavior::Succeed);
    let resolver = resolver(&[&premium, &vidzy, &voe]);

    let references = vec![
        EmbedReference::new("voe", Language::Vostfr, "https://voe.example/e/1"),
        EmbedReference::new("vidzy", Language::Vf, "https://vidzy.example/e/2"),
        EmbedReference::new("netu", Language::Vf, "https://netu.example/e/3"),
        EmbedReference::new("premium", Language::Vf, "https://fsvid.example/e/4"),
    ];

    let descriptors = resolve_all(&resolver, &references, Duration::from_secs(5)).await;

    let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["[VOSTFR] Voe", "[VF] FSvid"]);
    assert!(descriptors.iter().all(|d| d.behavior_hints.not_web_ready));
    assert_eq!(vidzy.calls(), 1);
}

#[tokio::test]
async fn fan_out_with_total_failure_is_empty() {
    let vidzy = StubDecoder::new(Host::Vidzy, Behavior::Fail);
    let resolver = resolver(&[&vidzy]);

    let references = vec![
        EmbedReference::new("vidzy", Language::Vf, "https://vidzy.example/e/1"),
        EmbedReference::new("vidzy", Language::Vostfr, "https://vidzy.example/e/2"),
        EmbedReference::new("netu", Language::Vf, "https://netu.example/e/3"),
    ];

    let descriptors = resolve_all(&resolver, &references, Duration::from_secs(5)).await;
    assert!(descriptors.is_empty());
    assert_eq!(vidzy.calls(), 2);
}

#[tokio::test]
async fn slow_entry_times_out_without_blocking_others() {
    let voe = StubDecoder::new(Host::Voe, Behavior::Hang);
    let uqload = StubDecoder::new(Host::Uqload, Behavior::Succeed);
    let resolver = resolver(&[&voe, &uqload]);

    let references = vec![
        EmbedReference::new("voe", Language::Vf, "https://voe.example/e/1"),
        EmbedReference::new("uqload", Language::Vf, "https://uqload.example/e/2"),
    ];

    let descriptors = resolve_all(&resolver, &references, Duration::from_millis(100)).await;
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].title, "Uqload - VF");
}

#[tokio::test]
async fn fan_out_of_nothing_is_empty() {
    let resolver = resolver(&[]);
    assert!(resolve_all(&resolver, &[], Duration::from_secs(1)).await.is_empty());
}
