//! Prompt templating for text-to-audio generation.
//!
//! A composition has one *base prompt*, built from the profile's tags and
//! top keywords with one of four templates, and one *segment prompt* per
//! segment: `"{base}, {descriptor} section"`.

use rand::Rng;

use crate::analysis::ContentProfile;

/// Number of profile keywords woven into the prompt.
pub const PROMPT_KEYWORDS: usize = 5;

/// Descriptors for the default six-segment structure.
pub const SEGMENT_DESCRIPTORS: &[&str] =
    &["intro", "building", "main theme", "variation", "bridge", "outro"];

const MIDDLE_DESCRIPTORS: &[&str] = &["building", "main theme", "variation", "bridge"];

/// Number of base prompt templates.
pub const TEMPLATE_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Style maps
// ---------------------------------------------------------------------------

pub fn genre_style(genre: &str) -> &'static str {
    match genre {
        "romance" => "emotional and tender melody with soft instrumentation",
        "action" => "energetic and powerful music with strong percussion and dynamic rhythm",
        "fantasy" => "magical and enchanting composition with mystical elements",
        "horror" => "eerie and tense atmospheric music with dissonant tones",
        "comedy" => "light and playful melody with quirky elements",
        "thriller" => "suspenseful music with building tension and dramatic moments",
        "sci-fi" => "futuristic electronic sounds with innovative textures",
        "slice_of_life" => "gentle and simple melody reflecting everyday moments",
        "historical" => "traditional instrumentation with cultural elements",
        "sports" => "energetic and triumphant music with motivational elements",
        "drama" => "emotional and moving composition with heartfelt melody",
        "supernatural" => "mysterious and otherworldly sounds with ethereal elements",
        _ => "melodic instrumental music",
    }
}

pub fn mood_style(mood: &str) -> &'static str {
    match mood {
        "happy" => "upbeat and cheerful with bright tones",
        "sad" => "melancholic and emotional with minor key progression",
        "exciting" => "thrilling and dynamic with energetic rhythm",
        "scary" => "dark and ominous with unsettling elements",
        "romantic" => "tender and intimate with warm harmonies",
        "mysterious" => "intriguing and enigmatic with curious progression",
        "peaceful" => "calm and serene with gentle flow",
        "tense" => "suspenseful and anxious with building intensity",
        "nostalgic" => "wistful and sentimental with reflective quality",
        "epic" => "grand and majestic with powerful dynamics",
        "comical" => "playful and light with quirky elements",
        "dreamy" => "ethereal and floating with surreal quality",
        _ => "emotional and expressive",
    }
}

pub fn era_style(era: &str) -> &'static str {
    match era {
        "modern" => "contemporary sound with current production techniques",
        "future" => "futuristic electronic elements with advanced sound design",
        "medieval" => "ancient instruments and traditional melodies",
        "ancient" => "classical elements with timeless quality",
        "prehistoric" => "primitive percussion and primal sounds",
        "victorian" => "elegant classical instrumentation with refined quality",
        "renaissance" => "artistic classical arrangements with cultural elements",
        "post_apocalyptic" => "desolate atmosphere with sparse instrumentation",
        _ => "contemporary sound",
    }
}

pub fn music_style_description(style: &str) -> &'static str {
    match style {
        "orchestral" => "grand orchestral arrangement with rich instrumentation",
        "electronic" => "modern electronic production with digital elements",
        "acoustic" => "natural acoustic instruments with organic quality",
        "rock" => "electric guitars and drums with strong energy",
        "jazz" => "smooth jazz elements with sophisticated harmonies",
        "pop" => "catchy pop melody with contemporary production",
        "ambient" => "atmospheric textures with spacious sound design",
        "folk" => "traditional folk instruments with authentic feel",
        "cinematic" => "dramatic film score style with emotional impact",
        "hip_hop" => "rhythmic beats with urban feel",
        "lo_fi" => "relaxed lo-fi beats with warm nostalgic quality",
        _ => "cinematic instrumental music",
    }
}

fn top_keywords(profile: &ContentProfile) -> &[String] {
    &profile.keywords[..profile.keywords.len().min(PROMPT_KEYWORDS)]
}

/// Cache key identifying a composition: top keywords and the four tags.
pub fn cache_key(profile: &ContentProfile) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        top_keywords(profile).join("-"),
        profile.genre,
        profile.mood,
        profile.era,
        profile.music_style
    )
}

/// Descriptor of segment `index` out of `count`.
///
/// Six segments use [`SEGMENT_DESCRIPTORS`] in order. Other counts start
/// with `intro`, end with `outro` and cycle the middle descriptors.
pub fn segment_descriptor(index: usize, count: usize) -> &'static str {
    if count == SEGMENT_DESCRIPTORS.len() {
        return SEGMENT_DESCRIPTORS[index.min(count - 1)];
    }
    if index == 0 {
        "intro"
    } else if index + 1 >= count {
        "outro"
    } else {
        MIDDLE_DESCRIPTORS[(index - 1) % MIDDLE_DESCRIPTORS.len()]
    }
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds base and segment prompts for a fixed number of segments.
///
/// # Example
/// ```rust
/// use webtoon_music::analysis::ContentProfile;
/// use webtoon_music::music::PromptBuilder;
///
/// let builder = PromptBuilder::new(6);
/// let base = builder.base_prompt(&ContentProfile::fallback(), 0);
/// assert!(base.ends_with("no vocals"));
/// assert_eq!(builder.segment_prompts(&base).len(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    segments: usize,
}

impl PromptBuilder {
    pub fn new(segments: usize) -> Self {
        Self {
            segments: segments.max(1),
        }
    }

    /// Base prompt using template `template` (taken modulo
    /// [`TEMPLATE_COUNT`]).
    pub fn base_prompt(&self, profile: &ContentProfile, template: usize) -> String {
        let genre = genre_style(&profile.genre);
        let mood = mood_style(&profile.mood);
        let era = era_style(&profile.era);
        let style = music_style_description(&profile.music_style);
        let keywords = top_keywords(profile).join(", ");

        match template % TEMPLATE_COUNT {
            0 => format!(
                "{genre} with {mood}, {style}, inspired by themes of {keywords}, no vocals"
            ),
            1 => format!(
                "{style} that feels {mood}, with elements of {genre}, inspired by {keywords}, instrumental"
            ),
            2 => format!("{era} {style} with {mood} atmosphere, related to {keywords}, no lyrics"),
            _ => format!(
                "An instrumental {style} piece that captures {mood} and {genre}, inspired by {keywords}"
            ),
        }
    }

    /// Base prompt with a randomly chosen template.
    pub fn random_base_prompt(&self, profile: &ContentProfile) -> String {
        let template = rand::thread_rng().gen_range(0..TEMPLATE_COUNT);
        self.base_prompt(profile, template)
    }

    /// One prompt per segment.
    pub fn segment_prompts(&self, base: &str) -> Vec<String> {
        (0..self.segments)
            .map(|i| format!("{base}, {} section", segment_descriptor(i, self.segments)))
            .collect()
    }

    /// Human-readable duration, e.g. `"2 minutes (6 segments)"`.
    pub fn duration_label(&self, secs_per_segment: f32, crossfade_ms: u32) -> String {
        let overlap = crossfade_ms as f32 / 1000.0 * (self.segments - 1) as f32;
        let total = (secs_per_segment * self.segments as f32 - overlap).max(0.0);
        let minutes = total / 60.0;
        if minutes >= 1.0 {
            format!("{minutes:.1} minutes ({} segments)", self.segments)
        } else {
            format!("{total:.0} seconds ({} segments)", self.segments)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ContentProfile {
        ContentProfile {
            keywords: ["rain", "night", "city", "detective", "secret", "umbrella"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            genre: "thriller".into(),
            mood: "tense".into(),
            era: "modern".into(),
            music_style: "jazz".into(),
        }
    }

    #[test]
    fn cache_key_uses_top_five_keywords() {
        assert_eq!(
            cache_key(&profile()),
            "rain-night-city-detective-secret-thriller-tense-modern-jazz"
        );
    }

    #[test]
    fn template_zero() {
        let base = PromptBuilder::new(6).base_prompt(&profile(), 0);
        assert_eq!(
            base,
            "suspenseful music with building tension and dramatic moments with suspenseful and \
             anxious with building intensity, smooth jazz elements with sophisticated harmonies, \
             inspired by themes of rain, night, city, detective, secret, no vocals"
        );
    }

    #[test]
    fn template_three_and_wraparound() {
        let b = PromptBuilder::new(6);
        let base = b.base_prompt(&profile(), 3);
        assert!(base.starts_with("An instrumental smooth jazz elements"));
        assert_eq!(b.base_prompt(&profile(), 7), base);
    }

    #[test]
    fn era_template_mentions_era() {
        let base = PromptBuilder::new(6).base_prompt(&profile(), 2);
        assert!(base.starts_with("contemporary sound with current production techniques"));
        assert!(base.ends_with("no lyrics"));
    }

    #[test]
    fn unknown_tags_use_defaults() {
        assert_eq!(genre_style("polka"), "melodic instrumental music");
        assert_eq!(mood_style(""), "emotional and expressive");
        assert_eq!(era_style("jurassic"), "contemporary sound");
        assert_eq!(music_style_description("kazoo"), "cinematic instrumental music");
    }

    #[test]
    fn random_prompt_is_one_of_the_templates() {
        let b = PromptBuilder::new(6);
        let all: Vec<String> = (0..TEMPLATE_COUNT).map(|t| b.base_prompt(&profile(), t)).collect();
        for _ in 0..10 {
            assert!(all.contains(&b.random_base_prompt(&profile())));
        }
    }

    #[test]
    fn six_segments_use_canonical_descriptors() {
        let prompts = PromptBuilder::new(6).segment_prompts("base");
        assert_eq!(prompts[0], "base, intro section");
        assert_eq!(prompts[2], "base, main theme section");
        assert_eq!(prompts[5], "base, outro section");
    }

    #[test]
    fn other_segment_counts() {
        let d: Vec<_> = (0..8).map(|i| segment_descriptor(i, 8)).collect();
        assert_eq!(
            d,
            vec![
                "intro",
                "building",
                "main theme",
                "variation",
                "bridge",
                "building",
                "main theme",
                "outro",
            ]
        );
        assert_eq!(segment_descriptor(0, 1), "intro");
        assert_eq!(
            (0..2).map(|i| segment_descriptor(i, 2)).collect::<Vec<_>>(),
            vec!["intro", "outro"]
        );
    }

    #[test]
    fn few_keywords() {
        let mut p = profile();
        p.keywords.truncate(2);
        assert!(cache_key(&p).starts_with("rain-night-thriller"));
    }

    #[test]
    fn duration_label_minutes() {
        let label = PromptBuilder::new(6).duration_label(20.0, 1000);
        assert_eq!(label, "1.9 minutes (6 segments)");
    }
}
