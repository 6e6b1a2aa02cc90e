//! Seed data: the built-in question bank and the hard fallback.

use uuid::Uuid;

use crate::domain::{Question, QuestionKind, QuestionSource};

/// Built-in question bank covering the core modules. Guarantees the
/// app is useful even without an external TOML bank.
pub fn seed_questions() -> Vec<Question> {
  vec![
    Question {
      id: "q101".into(),
      module: "fundamentals".into(),
      lesson: "cap-theorem".into(),
      difficulty: "intro".into(),
      source: QuestionSource::Seed,
      prompt: "A network partition splits your replicated store. Which two properties does CAP force you to choose between?".into(),
      kind: QuestionKind::MultipleChoice {
        options: vec![
          "Consistency and availability".into(),
          "Latency and throughput".into(),
          "Durability and isolation".into(),
          "Sharding and replication".into(),
        ],
        correct: 0,
      },
      xp_reward: 10,
      explanation: "Partition tolerance is not optional once a partition exists; the trade is C vs A.".into(),
    },
    Question {
      id: "q102".into(),
      module: "fundamentals".into(),
      lesson: "load-balancing".into(),
      difficulty: "intro".into(),
      source: QuestionSource::Seed,
      prompt: "Which strategies keep a client pinned to the same backend across requests? Select all that apply.".into(),
      kind: QuestionKind::MultiSelect {
        options: vec![
          "Consistent hashing on client id".into(),
          "Pure round-robin".into(),
          "Cookie-based sticky sessions".into(),
          "Random two-choice".into(),
        ],
        correct: vec![0, 2],
      },
      xp_reward: 15,
      explanation: "Round-robin and power-of-two-choices deliberately spread a client across backends.".into(),
    },
    Question {
      id: "q103".into(),
      module: "fundamentals".into(),
      lesson: "estimation".into(),
      difficulty: "core".into(),
      source: QuestionSource::Seed,
      prompt: "Estimate storage for a photo service: 10M uploads/day, 2 MB average, 5-year retention. Walk through the arithmetic and name one lever that changes the answer by an order of magnitude.".into(),
      kind: QuestionKind::SelfJudged {
        sample_answer: "10M/day * 2MB = 20 TB/day, ~7.3 PB/year, ~36.5 PB over 5 years before replication. Replication factor (x3) or tiering cold photos to cheaper storage each move the number by roughly an order of magnitude.".into(),
      },
      xp_reward: 20,
      explanation: String::new(),
    },
    Question {
      id: "q201".into(),
      module: "caching".into(),
      lesson: "eviction".into(),
      difficulty: "intro".into(),
      source: QuestionSource::Seed,
      prompt: "Your cache must favor recently accessed keys under memory pressure. Which eviction policy fits?".into(),
      kind: QuestionKind::MultipleChoice {
        options: vec!["FIFO".into(), "LRU".into(), "Random".into(), "TTL only".into()],
        correct: 1,
      },
      xp_reward: 10,
      explanation: "LRU evicts the least recently used entry, so hot keys survive.".into(),
    },
    Question {
      id: "q202".into(),
      module: "caching".into(),
      lesson: "invalidation".into(),
      difficulty: "core".into(),
      source: QuestionSource::Seed,
      prompt: "Which of these are real hazards of cache-aside with a shared cache? Select all that apply.".into(),
      kind: QuestionKind::MultiSelect {
        options: vec![
          "Stale reads after a write race".into(),
          "Thundering herd on a hot-key miss".into(),
          "Write amplification on the primary store".into(),
          "Stampede when a popular TTL expires".into(),
        ],
        correct: vec![0, 1, 3],
      },
      xp_reward: 15,
      explanation: "Cache-aside does not amplify writes; the store sees each write once.".into(),
    },
    Question {
      id: "q301".into(),
      module: "databases".into(),
      lesson: "indexing".into(),
      difficulty: "intro".into(),
      source: QuestionSource::Seed,
      prompt: "A query filters on a high-cardinality column and returns a handful of rows. What usually helps most?".into(),
      kind: QuestionKind::MultipleChoice {
        options: vec![
          "A B-tree index on that column".into(),
          "A full table scan hint".into(),
          "Denormalizing the whole table".into(),
          "Raising the connection pool size".into(),
        ],
        correct: 0,
      },
      xp_reward: 10,
      explanation: String::new(),
    },
    Question {
      id: "q302".into(),
      module: "databases".into(),
      lesson: "replication".into(),
      difficulty: "core".into(),
      source: QuestionSource::Seed,
      prompt: "Design read-your-writes for a user profile service backed by async replicas. Cover routing and what you do when the replica lags.".into(),
      kind: QuestionKind::SelfJudged {
        sample_answer: "Route a user's reads to the primary for a short window after their write (session stickiness or a per-user version token); if a replica's applied LSN is behind the token, fall back to the primary or wait. Token can live in the session/cookie.".into(),
      },
      xp_reward: 20,
      explanation: String::new(),
    },
    Question {
      id: "q401".into(),
      module: "scaling".into(),
      lesson: "sharding".into(),
      difficulty: "core".into(),
      source: QuestionSource::Seed,
      prompt: "Which problems does consistent hashing address when a shard is added? Select all that apply.".into(),
      kind: QuestionKind::MultiSelect {
        options: vec![
          "Remapping only ~1/N of keys".into(),
          "Hot partitions from skewed keys".into(),
          "Avoiding a full rehash of the keyspace".into(),
          "Cross-shard transactions".into(),
        ],
        correct: vec![0, 2],
      },
      xp_reward: 15,
      explanation: "Skew and cross-shard transactions need separate mechanisms (virtual nodes help skew).".into(),
    },
    Question {
      id: "q402".into(),
      module: "scaling".into(),
      lesson: "queues".into(),
      difficulty: "advanced".into(),
      source: QuestionSource::Seed,
      prompt: "A payment webhook handler must process each event at least once and survive consumer crashes. Sketch the queueing design, including how you bound duplicate side effects.".into(),
      kind: QuestionKind::SelfJudged {
        sample_answer: "Durable queue with ack-after-processing and a visibility timeout for crash redelivery; consumers are idempotent, keyed on the event id (dedup table or conditional write), so at-least-once delivery never double-charges.".into(),
      },
      xp_reward: 25,
      explanation: String::new(),
    },
  ]
}

/// Absolute last-resort fallback: served when a lesson has no content.
pub fn hard_fallback_question(module: String, lesson: String) -> Question {
  Question {
    id: Uuid::new_v4().to_string(),
    module,
    lesson,
    difficulty: "intro".into(),
    source: QuestionSource::Seed,
    prompt: "Which component sits between clients and a pool of identical servers to spread traffic?".into(),
    kind: QuestionKind::MultipleChoice {
      options: vec![
        "A load balancer".into(),
        "A message queue".into(),
        "A write-ahead log".into(),
        "A bloom filter".into(),
      ],
      correct: 0,
    },
    xp_reward: 5,
    explanation: String::new(),
  }
}
