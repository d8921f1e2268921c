/*!
 * Masking engine tests over realistic paper fragments.
 */

use latrans::latex::masking::{MaskEngine, PLACEHOLDER_REGEX};

const PAPER_FRAGMENT: &str = r"\documentclass{article}
\usepackage{amsmath}
\title{On the Convergence of Things}
\begin{document}
\maketitle

\section{Introduction}
Deep models \cite{lecun2015deep} converge when the rate $\eta_t$ decays
like $\eta_t = \eta_0 / \sqrt{t}$, see Section~\ref{sec:analysis}.

\begin{equation}
  \label{eq:loss}
  \mathcal{L}(\theta) = \frac{1}{n} \sum_{i=1}^n \ell(f_\theta(x_i), y_i)
\end{equation}

As shown in \cite{kingma2014adam, robbins1951stochastic}, adaptive
methods behave differently. % check citation order
The bound $$ \mathbb{E}[\mathcal{L}] \le \epsilon $$ holds.

\begin{verbatim}
for t in range(T): theta -= eta * grad  # $ not math
\end{verbatim}

\input{sections/analysis}
\end{document}
";

#[test]
fn test_maskUnmask_onPaperFragment_shouldBeByteIdentical() {
    let masked = MaskEngine::mask(PAPER_FRAGMENT);
    let restored = MaskEngine::unmask(&masked.text, &masked.table).unwrap();

    assert_eq!(restored, PAPER_FRAGMENT);
}

#[test]
fn test_mask_onPaperFragment_shouldHideAllProtectedContent() {
    let masked = MaskEngine::mask(PAPER_FRAGMENT);

    for needle in [
        r"\cite{lecun2015deep}",
        r"\ref{sec:analysis}",
        r"\label{eq:loss}",
        r"$\eta_t$",
        r"\begin{equation}",
        r"\begin{verbatim}",
        r"\input{sections/analysis}",
    ] {
        assert!(
            !masked.text.contains(needle),
            "expected {:?} to be masked",
            needle
        );
    }
    // Prose survives in the masked buffer
    assert!(masked.text.contains("adaptive"));
    assert!(masked.text.contains("converge when the rate"));
}

#[test]
fn test_mask_placeholders_shouldBeUniqueAcrossBuffer() {
    let masked = MaskEngine::mask(PAPER_FRAGMENT);

    let mut tokens: Vec<&str> = PLACEHOLDER_REGEX
        .find_iter(&masked.text)
        .map(|m| m.as_str())
        .collect();
    let total = tokens.len();
    tokens.sort();
    tokens.dedup();

    assert_eq!(total, tokens.len(), "duplicate placeholder in masked text");
    assert_eq!(total, masked.table.len());
}

#[test]
fn test_classification_onMaskedBuffer_shouldBeIdempotent() {
    let masked = MaskEngine::mask(PAPER_FRAGMENT);
    let remasked = MaskEngine::mask(&masked.text);

    assert_eq!(
        remasked.table.len(),
        0,
        "placeholders must never be reclassified as protectable content"
    );
    assert_eq!(remasked.text, masked.text);
}

#[test]
fn test_maskUnmask_withWhitespaceHeavyInput_shouldPreserveEveryByte() {
    let text = "  leading spaces\n\n\n$m$\t\ttabs after math \r\n crlf line\n";
    let masked = MaskEngine::mask(text);
    let restored = MaskEngine::unmask(&masked.text, &masked.table).unwrap();

    assert_eq!(restored, text);
}
