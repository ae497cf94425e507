//! Lexicon scoring for genre, mood, era and music style.
//!
//! Each [`Lexicon`] is a static table of categories. A category scores one
//! point per non-overlapping occurrence of each of its terms in the
//! lowercased text; the highest score wins and ties go to the category
//! declared first. When nothing matches, the lexicon's default is used.
//!
//! | Lexicon            | Categories | Default         |
//! |--------------------|-----------:|-----------------|
//! | [`GENRES`]         |         12 | `slice_of_life` |
//! | [`MOODS`]          |         12 | `peaceful`      |
//! | [`ERAS`]           |          8 | `modern`        |
//! | [`MUSIC_STYLES`]   |         11 | `cinematic`     |

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One category of a lexicon.
pub struct Category {
    pub name: &'static str,
    /// English and Korean terms counted in the text.
    pub terms: &'static [&'static str],
    /// Four descriptive words appended to the keyword list when this
    /// category is dominant.
    pub descriptors: &'static [&'static str],
}

/// A named table of categories with a fallback.
pub struct Lexicon {
    pub kind: &'static str,
    pub categories: &'static [Category],
    pub default: &'static str,
}

/// The four dominant tags of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominantTags {
    pub genre: String,
    pub mood: String,
    pub era: String,
    pub music_style: String,
}

// ---------------------------------------------------------------------------
// Static lexicons
// ---------------------------------------------------------------------------

pub static GENRES: Lexicon = Lexicon {
    kind: "genre",
    default: "slice_of_life",
    categories: &[
        Category {
            name: "romance",
            terms: &[
                "love", "romance", "relationship", "couple", "dating", "사랑", "연애", "로맨스",
                "커플", "연인",
            ],
            descriptors: &["emotional", "sweet", "tender", "intimate"],
        },
        Category {
            name: "action",
            terms: &[
                "fight", "battle", "action", "war", "combat", "전투", "액션", "싸움", "전쟁",
                "격투",
            ],
            descriptors: &["powerful", "dynamic", "energetic", "strong"],
        },
        Category {
            name: "fantasy",
            terms: &[
                "magic", "dragon", "wizard", "elf", "fantasy", "마법", "판타지", "용", "마법사",
                "요정",
            ],
            descriptors: &["magical", "mystical", "enchanting", "wondrous"],
        },
        Category {
            name: "horror",
            terms: &[
                "ghost", "zombie", "horror", "scary", "fear", "귀신", "공포", "좀비", "무서움",
                "두려움",
            ],
            descriptors: &["eerie", "dark", "haunting", "sinister"],
        },
        Category {
            name: "comedy",
            terms: &[
                "funny", "comedy", "laugh", "humor", "joke", "코미디", "웃음", "유머", "재미",
                "농담",
            ],
            descriptors: &["light", "playful", "whimsical", "cheerful"],
        },
        Category {
            name: "thriller",
            terms: &[
                "suspense", "mystery", "crime", "detective", "스릴러", "서스펜스", "미스터리",
                "범죄", "탐정",
            ],
            descriptors: &["tense", "suspenseful", "gripping", "mysterious"],
        },
        Category {
            name: "sci-fi",
            terms: &[
                "future", "space", "alien", "robot", "technology", "미래", "우주", "외계인", "로봇",
                "기술",
            ],
            descriptors: &["futuristic", "technological", "innovative", "otherworldly"],
        },
        Category {
            name: "slice_of_life",
            terms: &[
                "daily", "life", "school", "ordinary", "일상", "학교", "생활", "평범한", "일상생활",
            ],
            descriptors: &["gentle", "everyday", "simple", "natural"],
        },
        Category {
            name: "historical",
            terms: &[
                "history", "dynasty", "kingdom", "ancient", "period", "역사", "왕조", "왕국",
                "고대", "시대극",
            ],
            descriptors: &["traditional", "noble", "ancient", "cultural"],
        },
        Category {
            name: "sports",
            terms: &[
                "sports", "game", "competition", "athlete", "team", "스포츠", "경기", "선수", "팀",
                "대회",
            ],
            descriptors: &["energetic", "competitive", "triumphant", "spirited"],
        },
        Category {
            name: "drama",
            terms: &[
                "drama", "emotional", "family", "conflict", "tragedy", "드라마", "감정", "가족",
                "갈등", "비극",
            ],
            descriptors: &["emotional", "moving", "poignant", "heartfelt"],
        },
        Category {
            name: "supernatural",
            terms: &[
                "ghost", "spirit", "psychic", "paranormal", "초자연", "영혼", "귀신", "초능력",
                "신비",
            ],
            descriptors: &["mysterious", "otherworldly", "magical", "ethereal"],
        },
    ],
};

pub static MOODS: Lexicon = Lexicon {
    kind: "mood",
    default: "peaceful",
    categories: &[
        Category {
            name: "happy",
            terms: &[
                "happy", "joy", "laugh", "cheerful", "bright", "행복", "기쁨", "웃음", "명랑",
                "밝음",
            ],
            descriptors: &["bright", "uplifting", "joyful", "cheerful"],
        },
        Category {
            name: "sad",
            terms: &[
                "sad", "cry", "tear", "sorrow", "melancholy", "슬픔", "눈물", "아픔", "우울", "비통",
            ],
            descriptors: &["melancholic", "somber", "emotional", "touching"],
        },
        Category {
            name: "exciting",
            terms: &[
                "exciting", "thrill", "adventure", "dynamic", "intense", "흥미", "모험", "스릴",
                "역동적", "강렬",
            ],
            descriptors: &["thrilling", "energetic", "dynamic", "powerful"],
        },
        Category {
            name: "scary",
            terms: &[
                "scary", "horror", "fear", "terror", "dread", "공포", "두려움", "무서움", "공포감",
                "전율",
            ],
            descriptors: &["dark", "ominous", "tense", "eerie"],
        },
        Category {
            name: "romantic",
            terms: &[
                "love", "romance", "kiss", "heart", "affection", "사랑", "로맨스", "키스", "애정",
                "설렘",
            ],
            descriptors: &["tender", "emotional", "intimate", "warm"],
        },
        Category {
            name: "mysterious",
            terms: &[
                "mystery", "secret", "puzzle", "enigma", "curious", "미스터리", "비밀", "수수께끼",
                "의문", "호기심",
            ],
            descriptors: &["intriguing", "enigmatic", "puzzling", "curious"],
        },
        Category {
            name: "peaceful",
            terms: &[
                "peace", "calm", "quiet", "relax", "serene", "평화", "고요", "휴식", "평온", "차분",
            ],
            descriptors: &["serene", "calm", "gentle", "soothing"],
        },
        Category {
            name: "tense",
            terms: &[
                "tension", "anxiety", "nervous", "suspense", "stress", "긴장", "불안", "초조",
                "서스펜스", "스트레스",
            ],
            descriptors: &["suspenseful", "anxious", "uneasy", "dramatic"],
        },
        Category {
            name: "nostalgic",
            terms: &[
                "nostalgia", "memory", "reminisce", "past", "childhood", "향수", "추억", "회상",
                "과거", "어린 시절",
            ],
            descriptors: &["reminiscent", "wistful", "reflective", "sentimental"],
        },
        Category {
            name: "epic",
            terms: &[
                "epic", "grand", "majestic", "magnificent", "heroic", "서사시", "웅장", "장엄",
                "영웅적", "대서사",
            ],
            descriptors: &["grand", "majestic", "powerful", "heroic"],
        },
        Category {
            name: "comical",
            terms: &[
                "funny", "comedy", "humorous", "witty", "silly", "코믹", "유머", "재미있는", "익살",
                "우스운",
            ],
            descriptors: &["playful", "light", "quirky", "amusing"],
        },
        Category {
            name: "dreamy",
            terms: &[
                "dream", "fantasy", "surreal", "ethereal", "magical", "꿈같은", "환상적",
                "초현실적", "신비로운", "마법같은",
            ],
            descriptors: &["ethereal", "floating", "surreal", "magical"],
        },
    ],
};

pub static ERAS: Lexicon = Lexicon {
    kind: "era",
    default: "modern",
    categories: &[
        Category {
            name: "modern",
            terms: &[
                "modern", "contemporary", "today", "present", "current", "현대", "현재", "요즘",
                "지금", "현시대",
            ],
            descriptors: &["contemporary", "urban", "current", "today"],
        },
        Category {
            name: "future",
            terms: &[
                "future", "futuristic", "sci-fi", "advanced", "dystopian", "미래", "미래적", "sf",
                "첨단", "디스토피아",
            ],
            descriptors: &["futuristic", "advanced", "technological", "innovative"],
        },
        Category {
            name: "medieval",
            terms: &[
                "medieval", "castle", "knight", "kingdom", "sword", "중세", "성", "기사", "왕국",
                "검",
            ],
            descriptors: &["ancient", "traditional", "historical", "old-world"],
        },
        Category {
            name: "ancient",
            terms: &[
                "ancient", "historical", "old", "traditional", "classic", "고대", "역사적", "옛날",
                "전통적", "고전",
            ],
            descriptors: &["classical", "timeless", "historical", "traditional"],
        },
        Category {
            name: "prehistoric",
            terms: &[
                "prehistoric", "dinosaur", "primitive", "caveman", "선사시대", "공룡", "원시",
                "동굴인",
            ],
            descriptors: &["primitive", "primal", "ancient", "raw"],
        },
        Category {
            name: "victorian",
            terms: &["victorian", "19th century", "industrial", "빅토리아", "19세기", "산업혁명"],
            descriptors: &["elegant", "refined", "classical", "traditional"],
        },
        Category {
            name: "renaissance",
            terms: &["renaissance", "baroque", "artistic", "르네상스", "바로크", "예술적"],
            descriptors: &["artistic", "cultural", "classical", "refined"],
        },
        Category {
            name: "post_apocalyptic",
            terms: &[
                "apocalypse", "post-apocalyptic", "ruins", "wasteland", "종말", "포스트 아포칼립스",
                "폐허", "황무지",
            ],
            descriptors: &["desolate", "barren", "ruined", "abandoned"],
        },
    ],
};

pub static MUSIC_STYLES: Lexicon = Lexicon {
    kind: "music style",
    default: "cinematic",
    categories: &[
        Category {
            name: "orchestral",
            terms: &[
                "orchestra", "symphony", "classical", "epic", "grand", "오케스트라", "교향곡",
                "클래식", "웅장한",
            ],
            descriptors: &["grand", "majestic", "powerful", "rich"],
        },
        Category {
            name: "electronic",
            terms: &[
                "electronic", "synth", "techno", "digital", "edm", "일렉트로닉", "신스", "테크노",
                "디지털",
            ],
            descriptors: &["modern", "digital", "synthetic", "pulsating"],
        },
        Category {
            name: "acoustic",
            terms: &[
                "acoustic", "guitar", "piano", "soft", "unplugged", "어쿠스틱", "기타", "피아노",
                "부드러운",
            ],
            descriptors: &["natural", "organic", "warm", "intimate"],
        },
        Category {
            name: "rock",
            terms: &[
                "rock", "guitar", "band", "electric", "heavy", "록", "기타", "밴드", "일렉트릭",
                "헤비",
            ],
            descriptors: &["energetic", "powerful", "driving", "strong"],
        },
        Category {
            name: "jazz",
            terms: &[
                "jazz", "saxophone", "trumpet", "swing", "blues", "재즈", "색소폰", "트럼펫",
                "스윙", "블루스",
            ],
            descriptors: &["smooth", "sophisticated", "complex", "improvisational"],
        },
        Category {
            name: "pop",
            terms: &[
                "pop", "catchy", "upbeat", "mainstream", "melody", "팝", "캐치한", "경쾌한",
                "대중적인", "멜로디",
            ],
            descriptors: &["catchy", "upbeat", "melodic", "contemporary"],
        },
        Category {
            name: "ambient",
            terms: &[
                "ambient", "atmospheric", "background", "calm", "space", "앰비언트", "대기적",
                "배경", "고요한", "공간감",
            ],
            descriptors: &["atmospheric", "spacious", "ethereal", "subtle"],
        },
        Category {
            name: "folk",
            terms: &[
                "folk", "traditional", "acoustic", "country", "ballad", "포크", "전통적",
                "어쿠스틱", "컨트리", "발라드",
            ],
            descriptors: &["traditional", "authentic", "rustic", "simple"],
        },
        Category {
            name: "cinematic",
            terms: &[
                "cinematic", "soundtrack", "film", "score", "theme", "영화음악", "사운드트랙",
                "영화", "스코어", "테마",
            ],
            descriptors: &["dramatic", "emotional", "powerful", "thematic"],
        },
        Category {
            name: "hip_hop",
            terms: &[
                "hip hop", "rap", "beat", "urban", "rhythm", "힙합", "랩", "비트", "어반", "리듬",
            ],
            descriptors: &["rhythmic", "urban", "cool", "contemporary"],
        },
        Category {
            name: "lo_fi",
            terms: &[
                "lo-fi", "chill", "relaxed", "mellow", "calm", "로파이", "칠", "편안한", "차분한",
            ],
            descriptors: &["relaxed", "mellow", "nostalgic", "warm"],
        },
    ],
};

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

impl Lexicon {
    /// Per-category scores in declaration order.
    pub fn score(&self, text: &str) -> Vec<(&'static str, usize)> {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .map(|cat| {
                let count = cat
                    .terms
                    .iter()
                    .map(|term| text.matches(term.to_lowercase().as_str()).count())
                    .sum();
                (cat.name, count)
            })
            .collect()
    }

    /// Highest-scoring category, or the default when every score is zero.
    pub fn dominant(&self, text: &str) -> &'static str {
        let mut best: Option<(&'static str, usize)> = None;
        for (name, count) in self.score(text) {
            // Strict comparison keeps the earlier category on ties.
            if count > 0 && best.map_or(true, |(_, b)| count > b) {
                best = Some((name, count));
            }
        }
        best.map(|(name, _)| name).unwrap_or(self.default)
    }

    /// Descriptor words of `name`, empty for unknown categories.
    pub fn descriptors(&self, name: &str) -> &'static [&'static str] {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.descriptors)
            .unwrap_or(&[])
    }
}

/// Score `text` against all four lexicons.
pub fn dominant_tags(text: &str) -> DominantTags {
    DominantTags {
        genre: GENRES.dominant(text).to_string(),
        mood: MOODS.dominant(text).to_string(),
        era: ERAS.dominant(text).to_string(),
        music_style: MUSIC_STYLES.dominant(text).to_string(),
    }
}

/// Descriptor words of the four dominant tags, deduplicated in order.
pub fn tag_descriptors(tags: &DominantTags) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let groups = [
        GENRES.descriptors(&tags.genre),
        MOODS.descriptors(&tags.mood),
        ERAS.descriptors(&tags.era),
        MUSIC_STYLES.descriptors(&tags.music_style),
    ];
    for word in groups.iter().flat_map(|g| g.iter()) {
        if !out.iter().any(|w| w == word) {
            out.push((*word).to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
