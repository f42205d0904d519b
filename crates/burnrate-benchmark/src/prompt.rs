use rand::Rng;

pub const PROMPT_PREFIX: &str = "Please reply back the following section unchanged: ";

const MIN_WORD_LENGTH: usize = 3;
const MAX_WORD_LENGTH: usize = 10;

fn random_word<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(MIN_WORD_LENGTH..=MAX_WORD_LENGTH);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Builds an echo prompt of `num_words` random lowercase words.
///
/// The content carries no meaning; it only controls the prompt size so the
/// prompt-processing side of the server is exercised without a corpus.
pub fn random_prompt(num_words: usize) -> String {
    let mut rng = rand::thread_rng();
    let words: Vec<String> = (0..num_words).map(|_| random_word(&mut rng)).collect();
    format!("{}{}", PROMPT_PREFIX, words.join(" "))
}
