/*!

This is the long-form manual for `voter_simulation` and `votesim`.

## Running a simulation

```text
votesim --input voters.csv --input-type csv --repetitions 3 --weight 0.8
```

Without `--input` (or with `--input-type sample`), a built-in sample of 10 voters is used.
The oracle is an OpenAI-compatible chat completion endpoint. The API key is read from the
environment variable `OPENAI_API_KEY` (configurable, see below). If it is not set, the program
stops before reading any voter.

The logging level is controlled with `RUST_LOG`. `--verbose` shows every prompt.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, with a header row
* `xlsx` Excel workbooks
* `sample` the built-in sample voters

### `csv`

The first row holds the names of the columns. The following columns are required, in any order:

```text
AGE,GENDER,STATE,EDUCATION_LEVEL,MARITAL_STATUS,OCCUPATION_DESCRIPTION,INCOME_LEVEL
40,female,Texas,master,married,teacher,4
```

Other columns are ignored, except `VOTE` (see [Replaying votes](#replaying-votes)).
`AGE` must be a positive integer and `INCOME_LEVEL` an integer between 1 and 10.
If some columns are missing, the error lists all of them.

### `xlsx`

Same layout as `csv`, in an Excel worksheet. The first worksheet is used unless
`--excel-worksheet-name` is given.

## Historical results

The 2020 results of 10 states are built in. Another table can be loaded with `--historical`,
as a CSV file with the columns:

```text
STATE,Democrat_real_percent,Republican_real_percent,Winner_real,Block
Ohio,45.2,53.3,Republican,Swing State
```

`Winner_real` is `Democrat` or `Republican`. `Block` is one of `Solidly Democratic`,
`Solidly Republican` or `Swing State`. The block is only used to describe the state
of a voter in the prompt.

## Outputs

The program prints a JSON summary with three tables keyed by uppercased state:
- `tallies`: the counts of simulated decisions and the simulated winner
- `comparison`: the simulated winner next to the real one, and whether it was correctly predicted
- `adjusted`: the simulated shares blended with the real ones:
  `weight * simulated + (1 - weight) * real`

States without historical data are reported with `No Real Data` and `Unknown Block`, and
their adjusted shares are the simulated ones.

With `--out`, the summary is written to a file instead. With `--reference`, the summary is
compared with an existing file and the program fails if they differ.

## Replaying votes

If the input has a `VOTE` column, `--replay` uses it instead of calling the oracle: `1` is a
vote for the first ticket, `2` for the second one, and anything else is undecided. This
makes it possible to recompute the reports of a previous run at no cost.

`--votes-out votes.csv` writes the voters of a run with such a `VOTE` column, so that the run
can be replayed later with `--input votes.csv --replay`. After a cancelled run, only the voters
processed so far are written.

## Summary

The JSON summary holds the tallies, the comparison, the accuracy and the adjusted results.
The `voters` array has one entry per processed voter, in input order, with its state, its raw
vote, its decision and the counts of its samples (`count1`, `count2`, `invalid`, `failed`;
null for replayed votes).

## Configuration

All the options can also be given in a JSON file with `--config`. Flags given on the
command line take precedence.

```json
{
  "outputSettings": {
    "contestName": "2024 simulation",
    "outputPath": "summary.json",
    "votesPath": "votes.csv"
  },
  "voterFileSources": [
    {
      "provider": "csv",
      "filePath": "voters.csv"
    }
  ],
  "historicalFilePath": "results_2020.csv",
  "oracle": {
    "model": "gpt-3.5-turbo",
    "apiKeyEnv": "OPENAI_API_KEY",
    "baseUrl": "https://api.openai.com/v1",
    "timeoutSeconds": 30,
    "structuredOutput": true
  },
  "rules": {
    "repetitions": "3",
    "simulationWeight": 0.8,
    "replayRecordedVotes": false
  }
}
```

Paths are relative to the configuration file. `repetitions` and `timeoutSeconds` accept
a number or a string. With `structuredOutput` set to false, the oracle is asked for free
text and only the first character of the answer is read.

 */
